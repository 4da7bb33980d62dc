//! In-app notification records.
//!
//! Categories are a closed set so each channel can match on them
//! exhaustively.

use serde::{Deserialize, Serialize};

use crate::types::{new_id, EntityId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// SOS alerts and connection failures.
    System,
    /// Caregiver messaging (reminders, relay test results).
    Messaging,
}

/// A transient notice shown in the in-app queue. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: EntityId,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub timestamp: Timestamp,
}

impl NotificationEvent {
    pub fn new(
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            id: new_id(),
            category,
            title: title.into(),
            message: message.into(),
            timestamp: at,
        }
    }
}
