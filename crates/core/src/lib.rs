//! Domain model for the vitalwatch patient monitor.
//!
//! Everything here is pure: no clocks, no I/O, no tasks. The monitor crate
//! owns the live state and feeds these types the current time.

pub mod alert;
pub mod compliance;
pub mod emergency;
pub mod error;
pub mod insight;
pub mod medication;
pub mod notification;
pub mod patient;
pub mod sos;
pub mod types;
pub mod vitals;
pub mod window;

pub use alert::AlertLevel;
pub use error::CoreError;
pub use patient::PatientState;
