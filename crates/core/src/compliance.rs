//! Missed-dose detection.
//!
//! Pure logic with no clock and no I/O. The caller passes the wall-clock time of
//! day and turns the report into log entries and notifications.

use crate::medication::{Medication, ScheduleTime};
use crate::types::EntityId;

/// A dose found overdue in this scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedDose {
    pub medication_id: EntityId,
    pub name: String,
    pub scheduled: ScheduleTime,
}

impl MissedDose {
    /// Note for the "Medication Alert" log entry.
    pub fn log_note(&self, contact: &str) -> String {
        format!(
            "Alert: Medication Missed ({}). Notification sent to {contact}.",
            self.name
        )
    }

    pub fn relay_text(&self, patient_name: &str) -> String {
        format!(
            "⚠️ *Medication Reminder*\n\nPatient {patient_name} missed their dose of *{}* at {}. Please check on them.",
            self.name, self.scheduled
        )
    }

    pub fn spoken_text(&self) -> String {
        format!(
            "Reminder: You missed your {}. A notification has been sent to your caregiver.",
            self.name
        )
    }

    pub fn in_app_message(&self) -> String {
        format!(
            "You missed your {} dose at {}. Please take it now.",
            self.name, self.scheduled
        )
    }
}

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceReport {
    /// Newly overdue doses, in list order. Each has had `reminder_sent` set.
    pub missed: Vec<MissedDose>,
    /// Ids of doses whose schedule time could not be parsed.
    pub malformed: Vec<EntityId>,
}

impl ComplianceReport {
    pub fn is_empty(&self) -> bool {
        self.missed.is_empty() && self.malformed.is_empty()
    }
}

/// Scan `medications` at time of day `now`.
///
/// A dose is missed when it is neither taken nor already reminded and `now`
/// is at or past its schedule time. Its `reminder_sent` flag is set here, so
/// a repeated scan yields nothing for it. Unparsable schedule times are
/// reported and skipped.
pub fn scan(medications: &mut [Medication], now: ScheduleTime) -> ComplianceReport {
    let mut report = ComplianceReport::default();

    for med in medications.iter_mut() {
        if med.taken || med.reminder_sent {
            continue;
        }
        let scheduled = match med.schedule() {
            Ok(t) => t,
            Err(_) => {
                report.malformed.push(med.id.clone());
                continue;
            }
        };
        if now >= scheduled {
            med.reminder_sent = true;
            report.missed.push(MissedDose {
                medication_id: med.id.clone(),
                name: med.name.clone(),
                scheduled,
            });
        }
    }

    report
}
