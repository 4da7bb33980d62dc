//! Fan-out of one logical event to speech, in-app, and relay channels.
//!
//! [`NotificationDispatcher::dispatch`] performs up to three independent,
//! best-effort side effects:
//!
//! 1. speech: the current utterance is replaced;
//! 2. in-app: a [`NotificationEvent`] is prepended to the queue and
//!    published on the [`EventBus`];
//! 3. relay: a fire-and-forget task sends the message externally, only
//!    when credentials are configured.
//!
//! None of them can fail the caller. The one path that reports relay
//! success back is [`NotificationDispatcher::send_test`].

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use vitalwatch_core::notification::{NotificationCategory, NotificationEvent};
use vitalwatch_core::patient::RelayCredentials;

use crate::bus::EventBus;
use crate::delivery::MessageRelay;
use crate::speech::SpeechOutput;

/// Default number of in-app notices retained; older ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

const TEST_MESSAGE: &str =
    "🏥 *VitalWatch Test Message*\n\nYour notification system is working correctly.";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct InAppNotice {
    category: NotificationCategory,
    title: String,
    message: String,
}

/// One logical event and the channels it should reach.
///
/// Constructed empty via [`Dispatch::new`] and filled with
/// [`with_speech`](Dispatch::with_speech),
/// [`with_notice`](Dispatch::with_notice), and
/// [`with_relay`](Dispatch::with_relay). Channels left unset are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    speech: Option<String>,
    notice: Option<InAppNotice>,
    relay: Option<String>,
}

impl Dispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speech(mut self, text: impl Into<String>) -> Self {
        self.speech = Some(text.into());
        self
    }

    pub fn with_notice(
        mut self,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.notice = Some(InAppNotice {
            category,
            title: title.into(),
            message: message.into(),
        });
        self
    }

    pub fn with_relay(mut self, text: impl Into<String>) -> Self {
        self.relay = Some(text.into());
        self
    }
}

/// What [`NotificationDispatcher::dispatch`] actually did.
#[derive(Debug, Clone, Default)]
pub struct DispatchReceipt {
    pub spoke: bool,
    pub notification: Option<NotificationEvent>,
    /// A relay task was spawned. Its outcome is not observed.
    pub relay_attempted: bool,
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

pub struct NotificationDispatcher {
    speech: Arc<dyn SpeechOutput>,
    relay: Arc<dyn MessageRelay>,
    bus: Arc<EventBus>,
    queue: RwLock<VecDeque<NotificationEvent>>,
    capacity: usize,
}

impl NotificationDispatcher {
    pub fn new(
        speech: Arc<dyn SpeechOutput>,
        relay: Arc<dyn MessageRelay>,
        bus: Arc<EventBus>,
        capacity: usize,
    ) -> Self {
        Self {
            speech,
            relay,
            bus,
            queue: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Fan `dispatch` out to its channels.
    ///
    /// The relay half runs on its own task and is never awaited here, so a
    /// hung relay cannot stall the caller.
    pub async fn dispatch(
        &self,
        dispatch: Dispatch,
        credentials: Option<&RelayCredentials>,
    ) -> DispatchReceipt {
        let mut receipt = DispatchReceipt::default();

        if let Some(text) = dispatch.speech {
            self.speech.speak(&text);
            receipt.spoke = true;
        }

        if let Some(notice) = dispatch.notice {
            let event = NotificationEvent::new(
                notice.category,
                notice.title,
                notice.message,
                Utc::now(),
            );
            self.push(event.clone()).await;
            receipt.notification = Some(event);
        }

        if let Some(text) = dispatch.relay {
            match credentials.filter(|c| c.is_configured()) {
                Some(creds) => {
                    let relay = Arc::clone(&self.relay);
                    let token = creds.bot_token.clone();
                    let chat_id = creds.chat_id.clone();
                    tokio::spawn(async move {
                        if !relay.send(&token, &chat_id, &text).await {
                            tracing::warn!("Caregiver relay attempt failed");
                        }
                    });
                    receipt.relay_attempted = true;
                }
                None => {
                    tracing::debug!("Relay credentials not configured, external message skipped");
                }
            }
        }

        receipt
    }

    /// Explicit relay check. Unlike [`dispatch`](Self::dispatch) this waits
    /// for the single attempt and reports the outcome, both as a return
    /// value and through speech plus an in-app notice.
    pub async fn send_test(&self, credentials: Option<&RelayCredentials>) -> bool {
        self.dispatch(
            Dispatch::new().with_notice(
                NotificationCategory::Messaging,
                "Telegram Bot",
                "Sending test message to your connected device...",
            ),
            None,
        )
        .await;

        let delivered = match credentials {
            Some(creds) => {
                self.relay
                    .send(&creds.bot_token, &creds.chat_id, TEST_MESSAGE)
                    .await
            }
            None => false,
        };

        let outcome = if delivered {
            Dispatch::new()
                .with_speech("Test message sent successfully.")
                .with_notice(
                    NotificationCategory::Messaging,
                    "Telegram Bot",
                    "Success! Check your Telegram app.",
                )
        } else {
            Dispatch::new()
                .with_speech("Could not send message. Please check your bot token.")
                .with_notice(
                    NotificationCategory::System,
                    "Connection Failed",
                    "Could not send a Telegram message. Please check your Bot Token and Chat ID in settings.",
                )
        };
        self.dispatch(outcome, None).await;

        delivered
    }

    // ---- queue ----

    async fn push(&self, event: NotificationEvent) {
        {
            let mut queue = self.queue.write().await;
            queue.push_front(event.clone());
            queue.truncate(self.capacity);
        }
        self.bus.publish(event);
    }

    /// Current queue, newest first.
    pub async fn notifications(&self) -> Vec<NotificationEvent> {
        self.queue.read().await.iter().cloned().collect()
    }

    /// Remove one notice. Returns `false` if it was already gone.
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut queue = self.queue.write().await;
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    pub async fn clear(&self) {
        self.queue.write().await.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
