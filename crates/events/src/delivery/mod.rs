//! External delivery channels for caregiver notifications.
//!
//! A relay gets exactly one attempt per message: no retry, no queue. The
//! boolean result is only surfaced by the explicit notification test; every
//! other caller fires and forgets.

pub mod telegram;

use async_trait::async_trait;

/// A messaging collaborator that can push text to a caregiver.
#[async_trait]
pub trait MessageRelay: Send + Sync {
    /// Send `text` to `target` authenticated by `credential`.
    ///
    /// Returns `true` on confirmed delivery. Must not panic or error.
    async fn send(&self, credential: &str, target: &str, text: &str) -> bool;
}
