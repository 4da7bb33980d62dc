//! Health insight records and the status-derived fallback.

use serde::{Deserialize, Serialize};

use crate::alert::AlertLevel;
use crate::patient::VitalsSnapshot;
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Info,
    Warning,
    Positive,
}

impl InsightCategory {
    /// Category for generated text: any elevated status is a warning,
    /// otherwise upbeat wording is positive.
    pub fn classify(status: AlertLevel, text: &str) -> Self {
        if status != AlertLevel::Stable {
            return InsightCategory::Warning;
        }
        let lower = text.to_lowercase();
        if ["good", "excellent", "stable"].iter().any(|w| lower.contains(w)) {
            InsightCategory::Positive
        } else {
            InsightCategory::Info
        }
    }
}

/// A short health observation shown alongside the vitals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub content: String,
    pub timestamp: Timestamp,
    pub category: InsightCategory,
}

/// Deterministic message for `status`, used whenever the generator is
/// unavailable or fails.
pub fn fallback(status: AlertLevel, at: Timestamp) -> Insight {
    let (content, category) = match status {
        AlertLevel::Critical => (
            "⚠️ CRITICAL ALERT: Heart rate spike detected (>120 BPM). Emergency protocols recommended immediately.",
            InsightCategory::Warning,
        ),
        AlertLevel::Warning => (
            "Observation: Slight elevation in blood pressure detected. Advise patient to sit and hydrate.",
            InsightCategory::Warning,
        ),
        AlertLevel::Stable => (
            "Health Status: Stable. Vitals are within normal ranges. Keep up the good work!",
            InsightCategory::Positive,
        ),
    };
    Insight {
        content: content.to_string(),
        timestamp: at,
        category,
    }
}

/// Prompt sent to the generator for `snapshot`.
pub fn prompt(snapshot: &VitalsSnapshot) -> String {
    format!(
        "Current Status: {}\n\
         Heart Rate: {:.0} bpm\n\
         Blood Pressure: {:.0}/{:.0} mmHg\n\
         Oxygen: {:.0}%\n\
         Temperature: {:.1} °F\n\n\
         Generate a short health insight based on these numbers.",
        snapshot.status,
        snapshot.heart_rate,
        snapshot.systolic,
        snapshot.diastolic,
        snapshot.oxygen,
        snapshot.temperature,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn fallback_tracks_status() {
        let now = Utc::now();
        assert_eq!(fallback(AlertLevel::Critical, now).category, InsightCategory::Warning);
        assert!(fallback(AlertLevel::Critical, now).content.contains("CRITICAL"));
        assert_eq!(fallback(AlertLevel::Stable, now).category, InsightCategory::Positive);
    }

    #[test]
    fn classify_prefers_status_over_wording() {
        assert_eq!(
            InsightCategory::classify(AlertLevel::Critical, "All good"),
            InsightCategory::Warning
        );
        assert_eq!(
            InsightCategory::classify(AlertLevel::Stable, "Excellent readings"),
            InsightCategory::Positive
        );
        assert_eq!(
            InsightCategory::classify(AlertLevel::Stable, "Drink some water"),
            InsightCategory::Info
        );
    }

    #[test]
    fn prompt_includes_readings() {
        let snapshot = VitalsSnapshot {
            status: AlertLevel::Critical,
            heart_rate: 151.0,
            systolic: 171.0,
            diastolic: 76.0,
            oxygen: 91.2,
            temperature: 98.64,
            taken_at: Utc::now(),
        };
        let text = prompt(&snapshot);
        assert!(text.contains("Current Status: CRITICAL"));
        assert!(text.contains("Blood Pressure: 171/76 mmHg"));
        assert!(text.contains("Temperature: 98.6 °F"));
    }
}
