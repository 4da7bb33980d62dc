//! Recording fakes shared by the monitor integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use vitalwatch_core::alert::AlertLevel;
use vitalwatch_core::insight::{Insight, InsightCategory};
use vitalwatch_core::medication::{Medication, MedicationType, ScheduleTime};
use vitalwatch_core::patient::{EmergencyContact, PatientProfile, RelayCredentials, VitalsSnapshot};
use vitalwatch_events::{MessageRelay, SpeechOutput};
use vitalwatch_monitor::background::compliance::WallClock;
use vitalwatch_monitor::geocode::{GeocodeError, Geocoder};
use vitalwatch_monitor::insight::{InsightError, InsightGateway, InsightGenerator};
use vitalwatch_monitor::profile::InMemoryProfileStore;
use vitalwatch_monitor::{Collaborators, MonitorConfig, MonitorHandle, Session};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSpeech {
    pub spoken: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl SpeechOutput for RecordingSpeech {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

pub struct RecordingRelay {
    pub sent: Mutex<Vec<String>>,
    pub succeed: bool,
}

impl RecordingRelay {
    pub fn new(succeed: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            succeed,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageRelay for RecordingRelay {
    async fn send(&self, _credential: &str, _target: &str, text: &str) -> bool {
        self.sent.lock().unwrap().push(text.to_string());
        self.succeed
    }
}

/// Records the status of every snapshot it is asked about.
#[derive(Default)]
pub struct RecordingGenerator {
    pub requests: Mutex<Vec<VitalsSnapshot>>,
}

impl RecordingGenerator {
    pub fn statuses(&self) -> Vec<AlertLevel> {
        self.requests.lock().unwrap().iter().map(|s| s.status).collect()
    }

    pub fn count_of(&self, status: AlertLevel) -> usize {
        self.statuses().into_iter().filter(|s| *s == status).count()
    }
}

#[async_trait]
impl InsightGenerator for RecordingGenerator {
    async fn generate(&self, snapshot: &VitalsSnapshot) -> Result<Insight, InsightError> {
        self.requests.lock().unwrap().push(*snapshot);
        Ok(Insight {
            content: format!("generated for {}", snapshot.status),
            timestamp: Utc::now(),
            category: InsightCategory::Info,
        })
    }
}

pub struct FixedGeocoder(pub Option<String>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn reverse(&self, _lat: f64, _lng: f64) -> Result<String, GeocodeError> {
        self.0.clone().ok_or(GeocodeError::NoAddress)
    }
}

/// Clock whose time of day tests can move.
pub struct ManualClock(Mutex<ScheduleTime>);

impl ManualClock {
    pub fn at(raw: &str) -> Self {
        Self(Mutex::new(time(raw)))
    }

    pub fn set(&self, raw: &str) {
        *self.0.lock().unwrap() = time(raw);
    }
}

impl WallClock for ManualClock {
    fn time_of_day(&self) -> ScheduleTime {
        *self.0.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn time(raw: &str) -> ScheduleTime {
    ScheduleTime::parse(raw).unwrap()
}

pub fn medication(id: &str, name: &str, at: &str, taken: bool) -> Medication {
    Medication {
        id: id.into(),
        name: name.into(),
        dosage: "10mg".into(),
        scheduled_time: at.into(),
        taken,
        reminder_sent: false,
        kind: MedicationType::Pill,
    }
}

pub fn profile() -> PatientProfile {
    PatientProfile {
        id: "PT-1".into(),
        name: "Margaret Thompson".into(),
        age: 72,
        phone_number: None,
        relay: Some(RelayCredentials::new("bot-token", "chat-1")),
        contacts: vec![EmergencyContact {
            id: "c1".into(),
            name: "Dr. Michael Chen".into(),
            relation: "Cardiologist".into(),
            phone: "555-0123".into(),
            is_primary: true,
        }],
    }
}

/// Intervals long enough that the tickers stay quiet unless a test waits
/// for them on purpose.
pub fn quiet_config() -> MonitorConfig {
    MonitorConfig {
        vitals_interval: Duration::from_secs(3600),
        compliance_interval: Duration::from_secs(3600),
        ..MonitorConfig::default()
    }
}

/// One set of recording collaborators.
pub struct Fakes {
    pub speech: Arc<RecordingSpeech>,
    pub relay: Arc<RecordingRelay>,
    pub generator: Arc<RecordingGenerator>,
    pub store: Arc<InMemoryProfileStore>,
    pub clock: Arc<ManualClock>,
    pub address: Option<String>,
}

impl Fakes {
    pub fn new(relay_succeeds: bool) -> Self {
        Self {
            speech: Arc::new(RecordingSpeech::default()),
            relay: Arc::new(RecordingRelay::new(relay_succeeds)),
            generator: Arc::new(RecordingGenerator::default()),
            store: Arc::new(InMemoryProfileStore::default()),
            clock: Arc::new(ManualClock::at("00:00")),
            address: Some("221B Baker Street, London".into()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            speech: self.speech.clone(),
            relay: self.relay.clone(),
            insights: InsightGateway::new(Some(self.generator.clone() as Arc<dyn InsightGenerator>)),
            geocoder: Arc::new(FixedGeocoder(self.address.clone())),
            store: self.store.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// A running session over [`Fakes`].
pub struct Harness {
    pub session: Session,
    pub fakes: Fakes,
}

impl Harness {
    pub fn start(config: MonitorConfig, medications: Vec<Medication>) -> Self {
        Self::start_with(config, profile(), medications, Fakes::new(true))
    }

    pub fn start_with(
        config: MonitorConfig,
        profile: PatientProfile,
        medications: Vec<Medication>,
        fakes: Fakes,
    ) -> Self {
        let session = Session::start(config, profile, medications, fakes.collaborators());
        Self { session, fakes }
    }

    pub fn handle(&self) -> MonitorHandle {
        self.session.handle().clone()
    }
}

/// Let spawned relay and insight tasks run to completion. Under paused
/// time the clock only advances once every runnable task has yielded.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
