//! Medication records, schedule times, and adherence.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{new_id, EntityId};

/// Minutes in a day; schedule times are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Form of a medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicationType {
    #[default]
    Pill,
    Liquid,
    Injection,
}

impl MedicationType {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pill" => Ok(Self::Pill),
            "liquid" => Ok(Self::Liquid),
            "injection" => Ok(Self::Injection),
            other => Err(CoreError::Validation(format!(
                "Unknown medication type: '{other}'. Valid types: pill, liquid, injection"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduleTime
// ---------------------------------------------------------------------------

/// A time of day, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleTime(u16);

impl ScheduleTime {
    /// Parse an `HH:MM` string (24-hour clock).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::Validation(format!("Invalid schedule time: '{raw}'"));

        let (h, m) = raw.trim().split_once(':').ok_or_else(invalid)?;
        let hours: u16 = h.parse().map_err(|_| invalid())?;
        let minutes: u16 = m.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 || m.len() != 2 {
            return Err(invalid());
        }
        Ok(Self(hours * 60 + minutes))
    }

    /// Time-of-day part of a wall clock reading.
    pub fn of(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

// ---------------------------------------------------------------------------
// Medication
// ---------------------------------------------------------------------------

/// A scheduled daily dose.
///
/// `scheduled_time` is kept as entered so that records hydrated from
/// elsewhere can carry an unparsable value; the compliance scan skips
/// those instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: EntityId,
    pub name: String,
    pub dosage: String,
    pub scheduled_time: String,
    pub taken: bool,
    pub reminder_sent: bool,
    #[serde(rename = "type")]
    pub kind: MedicationType,
}

impl Medication {
    pub fn schedule(&self) -> Result<ScheduleTime, CoreError> {
        ScheduleTime::parse(&self.scheduled_time)
    }
}

/// Input for adding a medication. The id and flags are assigned on creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub scheduled_time: String,
    #[serde(default, rename = "type")]
    pub kind: MedicationType,
}

impl NewMedication {
    /// Validate and turn into a fresh, not-taken, not-reminded record.
    pub fn into_medication(self) -> Result<Medication, CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Medication name must not be empty".into()));
        }
        let schedule = ScheduleTime::parse(&self.scheduled_time)?;
        Ok(Medication {
            id: new_id(),
            name: name.to_string(),
            dosage: self.dosage.trim().to_string(),
            scheduled_time: schedule.to_string(),
            taken: false,
            reminder_sent: false,
            kind: self.kind,
        })
    }
}

/// Flip `taken` on the medication with `id`, returning the new value.
pub fn toggle_taken(medications: &mut [Medication], id: &str) -> Result<bool, CoreError> {
    let med = medications
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "medication",
            id: id.to_string(),
        })?;
    med.taken = !med.taken;
    Ok(med.taken)
}

/// Day-boundary reset: clears `taken` and `reminder_sent` on every dose.
///
/// Only ever invoked by an external caller; the compliance scan never
/// resets its own flags.
pub fn reset_daily(medications: &mut [Medication]) {
    for med in medications {
        med.taken = false;
        med.reminder_sent = false;
    }
}

// ---------------------------------------------------------------------------
// Adherence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdherenceSummary {
    pub taken: usize,
    pub total: usize,
    /// Names of doses not yet taken, in schedule order.
    pub pending: Vec<String>,
}

impl AdherenceSummary {
    pub fn from_medications(medications: &[Medication]) -> Self {
        let mut pending: Vec<&Medication> = medications.iter().filter(|m| !m.taken).collect();
        pending.sort_by(|a, b| a.scheduled_time.cmp(&b.scheduled_time));
        Self {
            taken: medications.len() - pending.len(),
            total: medications.len(),
            pending: pending.into_iter().map(|m| m.name.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn med(id: &str, name: &str, time: &str, taken: bool) -> Medication {
        Medication {
            id: id.into(),
            name: name.into(),
            dosage: "10mg".into(),
            scheduled_time: time.into(),
            taken,
            reminder_sent: false,
            kind: MedicationType::Pill,
        }
    }

    // -----------------------------------------------------------------------
    // ScheduleTime
    // -----------------------------------------------------------------------

    #[test]
    fn parses_valid_times() {
        assert_eq!(ScheduleTime::parse("08:00").unwrap().minutes_since_midnight(), 480);
        assert_eq!(ScheduleTime::parse("23:59").unwrap().minutes_since_midnight(), 1439);
        assert_eq!(ScheduleTime::parse(" 7:05 ").unwrap().to_string(), "07:05");
    }

    #[test]
    fn rejects_malformed_times() {
        for raw in ["", "8", "24:00", "12:60", "ab:cd", "12:5", "noon"] {
            assert_matches!(ScheduleTime::parse(raw), Err(CoreError::Validation(_)), "{raw}");
        }
    }

    #[test]
    fn of_wall_clock_drops_seconds() {
        let t = NaiveTime::from_hms_opt(9, 10, 59).unwrap();
        assert_eq!(ScheduleTime::of(t).to_string(), "09:10");
    }

    // -----------------------------------------------------------------------
    // NewMedication
    // -----------------------------------------------------------------------

    #[test]
    fn new_medication_normalizes_and_resets_flags() {
        let med = NewMedication {
            name: "  Metformin ".into(),
            dosage: "500mg".into(),
            scheduled_time: "9:00".into(),
            kind: MedicationType::Liquid,
        }
        .into_medication()
        .unwrap();

        assert_eq!(med.name, "Metformin");
        assert_eq!(med.scheduled_time, "09:00");
        assert!(!med.taken);
        assert!(!med.reminder_sent);
        assert!(!med.id.is_empty());
    }

    #[test]
    fn new_medication_requires_name_and_time() {
        let blank = NewMedication {
            name: " ".into(),
            dosage: String::new(),
            scheduled_time: "08:00".into(),
            kind: MedicationType::Pill,
        };
        assert_matches!(blank.into_medication(), Err(CoreError::Validation(_)));

        let bad_time = NewMedication {
            name: "Aspirin".into(),
            dosage: "81mg".into(),
            scheduled_time: "25:00".into(),
            kind: MedicationType::Pill,
        };
        assert_matches!(bad_time.into_medication(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn medication_type_parse() {
        assert_eq!(MedicationType::parse("Injection").unwrap(), MedicationType::Injection);
        assert!(MedicationType::parse("patch").is_err());
    }

    // -----------------------------------------------------------------------
    // Toggle / reset / adherence
    // -----------------------------------------------------------------------

    #[test]
    fn toggle_flips_and_reports() {
        let mut meds = vec![med("1", "Lisinopril", "08:00", false)];
        assert!(toggle_taken(&mut meds, "1").unwrap());
        assert!(!toggle_taken(&mut meds, "1").unwrap());
        assert_matches!(
            toggle_taken(&mut meds, "missing"),
            Err(CoreError::NotFound { entity: "medication", .. })
        );
    }

    #[test]
    fn reset_clears_both_flags() {
        let mut meds = vec![med("1", "Lisinopril", "08:00", true)];
        meds[0].reminder_sent = true;
        reset_daily(&mut meds);
        assert!(!meds[0].taken);
        assert!(!meds[0].reminder_sent);
    }

    #[test]
    fn adherence_lists_pending_in_schedule_order() {
        let meds = vec![
            med("3", "Aspirin", "21:00", false),
            med("1", "Lisinopril", "08:00", true),
            med("2", "Metformin", "12:00", false),
        ];
        let summary = AdherenceSummary::from_medications(&meds);
        assert_eq!(summary.taken, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, vec!["Metformin", "Aspirin"]);
    }
}
