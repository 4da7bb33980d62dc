//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub through which presentation
//! layers observe in-app notifications without polling the queue. It is
//! designed to be shared via `Arc<EventBus>`.

use tokio::sync::broadcast;
use vitalwatch_core::notification::NotificationEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use chrono::Utc;
/// use vitalwatch_core::notification::{NotificationCategory, NotificationEvent};
/// use vitalwatch_events::EventBus;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(NotificationEvent::new(
///     NotificationCategory::System,
///     "CRITICAL ALERT",
///     "Emergency contacts are being notified.",
///     Utc::now(),
/// ));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the dispatcher's queue still holds it.
    pub fn publish(&self, event: NotificationEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
