//! Emergency log entries and the kinds of incident they record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{new_id, EntityId, Timestamp};

/// Suffix appended to an entry's notes when resolution acknowledges it.
pub const ACKNOWLEDGED_SUFFIX: &str = " [Acknowledged]";

/// What set off a real SOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyKind {
    Cardiac,
    Fall,
}

impl EmergencyKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cardiac" => Some(Self::Cardiac),
            "fall" => Some(Self::Fall),
            _ => None,
        }
    }

    /// Note stored on the log entry.
    pub fn note(self) -> &'static str {
        match self {
            EmergencyKind::Cardiac => "Heart rate > 140 BPM detected via manual simulation.",
            EmergencyKind::Fall => "Sudden fall detected by motion sensor.",
        }
    }

    /// Short reason used in caregiver messages.
    pub fn reason(self) -> &'static str {
        match self {
            EmergencyKind::Cardiac => "Heart Rate Spike",
            EmergencyKind::Fall => "Fall Detected",
        }
    }

    pub fn spoken_alert(self) -> &'static str {
        match self {
            EmergencyKind::Cardiac => {
                "Warning. Heart rate anomaly detected. Emergency protocols initiated."
            }
            EmergencyKind::Fall => "Warning. A fall has been detected. Emergency protocols initiated.",
        }
    }

    pub fn in_app_message(self) -> &'static str {
        match self {
            EmergencyKind::Cardiac => {
                "Abnormal heart rate detected. Emergency contacts are being notified."
            }
            EmergencyKind::Fall => "A fall was detected. Emergency contacts are being notified.",
        }
    }
}

/// Closed set of log entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    CriticalVitalsSpike,
    FallDetected,
    SystemTest,
    MedicationAlert,
}

impl LogKind {
    pub fn label(self) -> &'static str {
        match self {
            LogKind::CriticalVitalsSpike => "Critical Vitals Spike",
            LogKind::FallDetected => "Fall Detected",
            LogKind::SystemTest => "System Test",
            LogKind::MedicationAlert => "Medication Alert",
        }
    }
}

impl From<EmergencyKind> for LogKind {
    fn from(kind: EmergencyKind) -> Self {
        match kind {
            EmergencyKind::Cardiac => LogKind::CriticalVitalsSpike,
            EmergencyKind::Fall => LogKind::FallDetected,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One incident record. Only `resolved` and `notes` change after creation,
/// and only through [`EmergencyLog::acknowledge_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyLogEntry {
    pub id: EntityId,
    pub timestamp: Timestamp,
    pub kind: LogKind,
    pub resolved: bool,
    pub notes: String,
}

impl EmergencyLogEntry {
    pub fn new(kind: LogKind, resolved: bool, notes: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: new_id(),
            timestamp: at,
            kind,
            resolved,
            notes: notes.into(),
        }
    }
}

/// Append-only incident log, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmergencyLog {
    entries: Vec<EmergencyLogEntry>,
}

impl EmergencyLog {
    pub fn record(&mut self, entry: EmergencyLogEntry) {
        self.entries.insert(0, entry);
    }

    /// Resolve every open entry, annotating its notes. Returns how many
    /// entries changed.
    pub fn acknowledge_all(&mut self) -> usize {
        let mut count = 0;
        for entry in self.entries.iter_mut().filter(|e| !e.resolved) {
            entry.resolved = true;
            entry.notes.push_str(ACKNOWLEDGED_SUFFIX);
            count += 1;
        }
        count
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.resolved).count()
    }

    pub fn count_of(&self, kind: LogKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn entries(&self) -> &[EmergencyLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
