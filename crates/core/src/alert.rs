//! Patient alert level and its transition rules.
//!
//! The level is cyclic over a session: an SOS trigger raises it to
//! [`AlertLevel::Critical`] and resolution returns it to
//! [`AlertLevel::Stable`]. [`AlertLevel::Warning`] is representable and has
//! transitions defined, but nothing in the engine enters it automatically.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The patient's current classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    #[default]
    Stable,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Stable => "STABLE",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::AlertLevel;
    use crate::error::CoreError;

    /// Returns the set of levels reachable from `from` in one step.
    ///
    /// A level never lists itself; re-entering the current level is handled
    /// by [`AlertState::transition`](super::AlertState::transition) as a
    /// no-op.
    pub fn valid_transitions(from: AlertLevel) -> &'static [AlertLevel] {
        match from {
            // SOS trigger. Warning is an extension point with no entry path.
            AlertLevel::Stable => &[AlertLevel::Critical, AlertLevel::Warning],
            AlertLevel::Warning => &[AlertLevel::Critical, AlertLevel::Stable],
            // Resolution.
            AlertLevel::Critical => &[AlertLevel::Stable],
        }
    }

    /// Check whether moving from `from` to `to` is allowed.
    pub fn can_transition(from: AlertLevel, to: AlertLevel) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a transition, returning [`CoreError::InvalidTransition`] for
    /// disallowed ones.
    pub fn validate_transition(from: AlertLevel, to: AlertLevel) -> Result<(), CoreError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition { from, to })
        }
    }
}

// ---------------------------------------------------------------------------
// AlertState
// ---------------------------------------------------------------------------

/// Holder for the single current level. Every change is one write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertState {
    level: AlertLevel,
}

impl AlertState {
    pub fn new(level: AlertLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// Move to `to`, returning the previous level.
    ///
    /// Re-entering the current level succeeds without change, which is what
    /// a superseding SOS trigger relies on.
    pub fn transition(&mut self, to: AlertLevel) -> Result<AlertLevel, CoreError> {
        let from = self.level;
        if from == to {
            return Ok(from);
        }
        state_machine::validate_transition(from, to)?;
        self.level = to;
        Ok(from)
    }
}
