//! Live patient monitoring.
//!
//! A [`Session`] owns one [`actor::PatientMonitor`] (the single writer of
//! the patient aggregate), the vitals and compliance tickers, and the SOS
//! countdown. Everything else talks to it through a [`MonitorHandle`].

pub mod actor;
pub mod background;
pub mod config;
pub mod error;
pub mod geocode;
pub mod handle;
pub mod insight;
pub mod profile;
pub mod session;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use handle::MonitorHandle;
pub use session::{Collaborators, Session};
