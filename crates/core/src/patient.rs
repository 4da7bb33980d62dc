//! The patient aggregate and the records it is made of.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alert::{AlertLevel, AlertState};
use crate::emergency::EmergencyLog;
use crate::error::CoreError;
use crate::medication::{AdherenceSummary, Medication};
use crate::types::{new_id, EntityId, Timestamp};
use crate::window::SlidingWindow;

/// Baseline values used to seed histories at session start.
pub const BASELINE_HEART_RATE: f64 = 72.0;
pub const BASELINE_SYSTOLIC: f64 = 118.0;
pub const BASELINE_DIASTOLIC: f64 = 76.0;
pub const BASELINE_OXYGEN: f64 = 98.0;
pub const BASELINE_TEMPERATURE_F: f64 = 98.6;

/// Address shown when reverse geocoding is unavailable.
pub const LOCATION_FALLBACK: &str = "Location Updated";

// ---------------------------------------------------------------------------
// Vital signs
// ---------------------------------------------------------------------------

/// Direction of the most recent change on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

impl Trend {
    /// Compare two consecutive readings; moves within `dead_band` are stable.
    pub fn between(previous: f64, current: f64, dead_band: f64) -> Self {
        let delta = current - previous;
        if delta > dead_band {
            Trend::Up
        } else if delta < -dead_band {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalPoint {
    pub time: Timestamp,
    pub value: f64,
}

/// One monitored channel with its bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSign {
    pub value: f64,
    pub unit: String,
    pub trend: Trend,
    pub history: SlidingWindow<VitalPoint>,
}

impl VitalSign {
    pub fn seeded(value: f64, unit: &str, window: usize, at: Timestamp) -> Self {
        Self {
            value,
            unit: unit.to_string(),
            trend: Trend::Stable,
            history: SlidingWindow::filled_with(window, |_| VitalPoint { time: at, value }),
        }
    }

    /// Record a new reading: updates the value and trend, slides the window.
    pub fn record(&mut self, value: f64, at: Timestamp, dead_band: f64) {
        self.trend = Trend::between(self.value, value, dead_band);
        self.value = value;
        self.history.push(VitalPoint { time: at, value });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressurePoint {
    pub time: Timestamp,
    pub systolic: f64,
    pub diastolic: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
    pub history: SlidingWindow<PressurePoint>,
}

impl BloodPressure {
    pub fn seeded(systolic: f64, diastolic: f64, window: usize, at: Timestamp) -> Self {
        Self {
            systolic,
            diastolic,
            history: SlidingWindow::filled_with(window, |_| PressurePoint {
                time: at,
                systolic,
                diastolic,
            }),
        }
    }

    pub fn record(&mut self, systolic: f64, diastolic: f64, at: Timestamp) {
        self.systolic = systolic;
        self.diastolic = diastolic;
        self.history.push(PressurePoint {
            time: at,
            systolic,
            diastolic,
        });
    }
}

// ---------------------------------------------------------------------------
// Identity, credentials, contacts
// ---------------------------------------------------------------------------

/// Messaging relay credentials. Both halves are opaque.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelayCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl RelayCredentials {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// The relay is only attempted when both halves are present.
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

impl fmt::Debug for RelayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: EntityId,
    pub name: String,
    pub relation: String,
    pub phone: String,
    pub is_primary: bool,
}

/// Input for [`PatientState::add_contact`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub relation: String,
    pub phone: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            address: LOCATION_FALLBACK.to_string(),
        }
    }
}

/// The durable part of a patient, read from the profile store at session
/// start and written back when it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: EntityId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub relay: Option<RelayCredentials>,
    #[serde(default)]
    pub contacts: Vec<EmergencyContact>,
}

/// Partial profile edit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub phone_number: Option<String>,
    pub relay: Option<RelayCredentials>,
}

// ---------------------------------------------------------------------------
// PatientState
// ---------------------------------------------------------------------------

/// The single mutable aggregate owned by the monitor for a session.
#[derive(Debug, Clone, Serialize)]
pub struct PatientState {
    pub id: EntityId,
    pub name: String,
    pub age: u32,
    pub phone_number: Option<String>,
    pub relay: Option<RelayCredentials>,
    pub status: AlertState,
    pub heart_rate: VitalSign,
    pub blood_pressure: BloodPressure,
    pub oxygen_level: VitalSign,
    pub temperature: VitalSign,
    pub medications: Vec<Medication>,
    pub logs: EmergencyLog,
    pub contacts: Vec<EmergencyContact>,
    pub location: Location,
}

impl PatientState {
    /// Hydrate a fresh aggregate from a profile. Every vital history is
    /// seeded to `window` baseline points.
    pub fn new(
        profile: PatientProfile,
        medications: Vec<Medication>,
        window: usize,
        now: Timestamp,
    ) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            age: profile.age,
            phone_number: profile.phone_number,
            relay: profile.relay,
            status: AlertState::default(),
            heart_rate: VitalSign::seeded(BASELINE_HEART_RATE, "BPM", window, now),
            blood_pressure: BloodPressure::seeded(
                BASELINE_SYSTOLIC,
                BASELINE_DIASTOLIC,
                window,
                now,
            ),
            oxygen_level: VitalSign::seeded(BASELINE_OXYGEN, "%", window, now),
            temperature: VitalSign::seeded(BASELINE_TEMPERATURE_F, "°F", window, now),
            medications,
            logs: EmergencyLog::default(),
            contacts: profile.contacts,
            location: Location::default(),
        }
    }

    pub fn level(&self) -> AlertLevel {
        self.status.level()
    }

    /// The durable projection written to the profile store.
    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            age: self.age,
            phone_number: self.phone_number.clone(),
            relay: self.relay.clone(),
            contacts: self.contacts.clone(),
        }
    }

    /// Credentials usable for a relay attempt, if any.
    pub fn relay_credentials(&self) -> Option<&RelayCredentials> {
        self.relay.as_ref().filter(|c| c.is_configured())
    }

    /// Apply a partial edit. Returns `true` when anything changed.
    pub fn apply_profile_update(&mut self, update: ProfileUpdate) -> Result<bool, CoreError> {
        let mut changed = false;
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::Validation("Patient name must not be empty".into()));
            }
            if name != self.name {
                self.name = name.to_string();
                changed = true;
            }
        }
        if let Some(age) = update.age {
            if age != self.age {
                self.age = age;
                changed = true;
            }
        }
        if let Some(phone) = update.phone_number {
            let phone = Some(phone).filter(|p| !p.trim().is_empty());
            if phone != self.phone_number {
                self.phone_number = phone;
                changed = true;
            }
        }
        if let Some(relay) = update.relay {
            let relay = Some(relay).filter(|r| r.is_configured());
            if relay != self.relay {
                self.relay = relay;
                changed = true;
            }
        }
        Ok(changed)
    }

    // ---- contacts ----

    /// The contact used to frame notifications: the primary one, or the
    /// first listed as a fallback.
    pub fn primary_contact(&self) -> Option<&EmergencyContact> {
        self.contacts
            .iter()
            .find(|c| c.is_primary)
            .or_else(|| self.contacts.first())
    }

    /// Add a contact. Marking it primary demotes any existing primary.
    pub fn add_contact(&mut self, new: NewContact) -> Result<EmergencyContact, CoreError> {
        if new.name.trim().is_empty() {
            return Err(CoreError::Validation("Contact name must not be empty".into()));
        }
        if new.is_primary {
            for contact in &mut self.contacts {
                contact.is_primary = false;
            }
        }
        let contact = EmergencyContact {
            id: new_id(),
            name: new.name.trim().to_string(),
            relation: new.relation,
            phone: new.phone,
            is_primary: new.is_primary,
        };
        self.contacts.push(contact.clone());
        Ok(contact)
    }

    pub fn remove_contact(&mut self, id: &str) -> bool {
        let before = self.contacts.len();
        self.contacts.retain(|c| c.id != id);
        self.contacts.len() != before
    }

    // ---- medications ----

    pub fn adherence(&self) -> AdherenceSummary {
        AdherenceSummary::from_medications(&self.medications)
    }

    // ---- snapshots ----

    /// Point-in-time copy of vitals and status for the insight collaborator.
    pub fn snapshot(&self, taken_at: Timestamp) -> VitalsSnapshot {
        VitalsSnapshot {
            status: self.level(),
            heart_rate: self.heart_rate.value,
            systolic: self.blood_pressure.systolic,
            diastolic: self.blood_pressure.diastolic,
            oxygen: self.oxygen_level.value,
            temperature: self.temperature.value,
            taken_at,
        }
    }
}

/// Immutable copy of the vitals that an insight is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    pub status: AlertLevel,
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub oxygen: f64,
    pub temperature: f64,
    pub taken_at: Timestamp,
}

impl VitalsSnapshot {
    /// Same readings, reported under a different status.
    pub fn with_status(mut self, status: AlertLevel) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile() -> PatientProfile {
        PatientProfile {
            id: "PT-1".into(),
            name: "Margaret Thompson".into(),
            age: 72,
            phone_number: None,
            relay: None,
            contacts: vec![
                EmergencyContact {
                    id: "c1".into(),
                    name: "Dr. Michael Chen".into(),
                    relation: "Cardiologist".into(),
                    phone: "555-0123".into(),
                    is_primary: false,
                },
                EmergencyContact {
                    id: "c2".into(),
                    name: "Sarah Thompson".into(),
                    relation: "Daughter".into(),
                    phone: "555-0199".into(),
                    is_primary: true,
                },
            ],
        }
    }

    #[test]
    fn new_state_seeds_every_history_to_window() {
        let state = PatientState::new(profile(), Vec::new(), 20, Utc::now());
        assert_eq!(state.heart_rate.history.len(), 20);
        assert_eq!(state.blood_pressure.history.len(), 20);
        assert_eq!(state.oxygen_level.history.len(), 20);
        assert_eq!(state.temperature.history.len(), 20);
        assert_eq!(state.level(), AlertLevel::Stable);
    }

    #[test]
    fn trend_respects_dead_band() {
        assert_eq!(Trend::between(72.0, 72.4, 0.5), Trend::Stable);
        assert_eq!(Trend::between(72.0, 73.0, 0.5), Trend::Up);
        assert_eq!(Trend::between(72.0, 70.0, 0.5), Trend::Down);
    }

    #[test]
    fn primary_contact_prefers_flagged_then_first() {
        let mut state = PatientState::new(profile(), Vec::new(), 2, Utc::now());
        assert_eq!(state.primary_contact().unwrap().name, "Sarah Thompson");

        state.remove_contact("c2");
        assert_eq!(state.primary_contact().unwrap().name, "Dr. Michael Chen");

        state.remove_contact("c1");
        assert!(state.primary_contact().is_none());
    }

    #[test]
    fn adding_primary_contact_demotes_previous() {
        let mut state = PatientState::new(profile(), Vec::new(), 2, Utc::now());
        let added = state
            .add_contact(NewContact {
                name: "Tom".into(),
                relation: "Son".into(),
                phone: "555-0100".into(),
                is_primary: true,
            })
            .unwrap();

        assert_eq!(state.contacts.iter().filter(|c| c.is_primary).count(), 1);
        assert_eq!(state.primary_contact().unwrap().id, added.id);
    }

    #[test]
    fn unconfigured_credentials_are_not_usable() {
        let mut state = PatientState::new(profile(), Vec::new(), 2, Utc::now());
        state.relay = Some(RelayCredentials::new("token", " "));
        assert!(state.relay_credentials().is_none());
    }

    #[test]
    fn profile_update_reports_changes() {
        let mut state = PatientState::new(profile(), Vec::new(), 2, Utc::now());
        let changed = state
            .apply_profile_update(ProfileUpdate {
                age: Some(73),
                relay: Some(RelayCredentials::new("t", "42")),
                ..Default::default()
            })
            .unwrap();
        assert!(changed);
        assert_eq!(state.profile().age, 73);

        let unchanged = state
            .apply_profile_update(ProfileUpdate {
                age: Some(73),
                ..Default::default()
            })
            .unwrap();
        assert!(!unchanged);
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = RelayCredentials::new("secret-token", "42");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("42"));
    }
}
