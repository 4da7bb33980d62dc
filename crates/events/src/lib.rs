//! Notification fan-out for the vitalwatch monitor.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for in-app
//!   [`NotificationEvent`](vitalwatch_core::notification::NotificationEvent)s,
//!   backed by `tokio::sync::broadcast`.
//! - [`NotificationDispatcher`]: turns one logical event into speech, an
//!   in-app notice, and an external relay message.
//! - [`speech`]: the spoken-output seam.
//! - [`delivery`]: external messaging relays (Telegram).

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod speech;

pub use bus::EventBus;
pub use delivery::telegram::TelegramRelay;
pub use delivery::MessageRelay;
pub use dispatcher::{Dispatch, DispatchReceipt, NotificationDispatcher};
pub use speech::{SpeechOutput, TracingSpeech};
