//! The owning actor for a session's [`PatientState`].
//!
//! [`PatientMonitor`] is the only code that mutates the aggregate. Tickers,
//! the countdown, delayed insight refreshes, and the public
//! [`MonitorHandle`] all talk to it through [`Command`]s, so every mutation
//! is computed from the state current at the moment it is processed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitalwatch_core::alert::AlertLevel;
use vitalwatch_core::compliance;
use vitalwatch_core::emergency::{EmergencyKind, EmergencyLogEntry, LogKind};
use vitalwatch_core::error::CoreError;
use vitalwatch_core::insight::Insight;
use vitalwatch_core::medication::{self, AdherenceSummary, Medication, NewMedication, ScheduleTime};
use vitalwatch_core::notification::NotificationCategory;
use vitalwatch_core::patient::{
    EmergencyContact, Location, NewContact, PatientProfile, PatientState, ProfileUpdate,
    RelayCredentials, VitalsSnapshot,
};
use vitalwatch_core::sos::{SosMode, SosPhase, SosSession};
use vitalwatch_core::vitals::VitalsSampler;
use vitalwatch_events::{Dispatch, NotificationDispatcher};

use crate::background;
use crate::config::MonitorConfig;
use crate::geocode::Geocoder;
use crate::handle::MonitorHandle;
use crate::insight::InsightGateway;
use crate::profile::ProfileStore;

const COMMAND_BUFFER: usize = 64;

const SYSTEM_TEST_NOTE: &str = "User initiated alarm system diagnostic check.";
const SYSTEM_TEST_SPEECH: &str = "System test initiated. Alarm speakers functional.";
const RESOLVED_SPEECH: &str = "Alarm cancelled. Systems returning to normal.";

/// Contact named in medication alerts when none is on file.
const DEFAULT_CONTACT: &str = "caregiver";

type Reply<T> = oneshot::Sender<T>;

/// Intents accepted by the actor.
pub(crate) enum Command {
    // ---- ticker intents ----
    RecordVitals,
    EvaluateCompliance {
        now: ScheduleTime,
        reply: Reply<usize>,
    },
    CountdownTick {
        generation: u64,
    },
    SetInsight {
        insight: Insight,
    },

    // ---- SOS protocol ----
    TriggerSos {
        kind: EmergencyKind,
        reply: Reply<()>,
    },
    RunSystemTest {
        reply: Reply<()>,
    },
    Resolve {
        reply: Reply<bool>,
    },

    // ---- medications ----
    ToggleMedication {
        id: String,
        reply: Reply<Result<bool, CoreError>>,
    },
    AddMedication {
        new: NewMedication,
        reply: Reply<Result<Medication, CoreError>>,
    },
    ResetDaily {
        reply: Reply<()>,
    },

    // ---- profile ----
    AddContact {
        new: NewContact,
        reply: Reply<Result<(EmergencyContact, PatientProfile), CoreError>>,
    },
    RemoveContact {
        id: String,
        reply: Reply<Option<PatientProfile>>,
    },
    UpdateProfile {
        update: ProfileUpdate,
        reply: Reply<Result<Option<PatientProfile>, CoreError>>,
    },
    SetLocation {
        location: Location,
        reply: Reply<()>,
    },

    // ---- reads ----
    Patient {
        reply: Reply<PatientState>,
    },
    Snapshot {
        reply: Reply<VitalsSnapshot>,
    },
    SosStatus {
        reply: Reply<SosPhase>,
    },
    CurrentInsight {
        reply: Reply<Option<Insight>>,
    },
    Adherence {
        reply: Reply<AdherenceSummary>,
    },
    Credentials {
        reply: Reply<Option<RelayCredentials>>,
    },
}

/// Services shared between the actor and its handles.
#[derive(Clone)]
pub struct MonitorServices {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub insights: InsightGateway,
    pub geocoder: Arc<dyn Geocoder>,
    pub store: Arc<dyn ProfileStore>,
}

pub struct PatientMonitor {
    state: PatientState,
    sos: SosSession,
    countdown: Option<CancellationToken>,
    insight: Option<Insight>,
    sampler: VitalsSampler,
    rng: StdRng,
    config: MonitorConfig,
    dispatcher: Arc<NotificationDispatcher>,
    insights: InsightGateway,
    commands: mpsc::Receiver<Command>,
    weak_tx: mpsc::WeakSender<Command>,
    cancel: CancellationToken,
}

impl PatientMonitor {
    /// Spawn the actor for `state`. It runs until `cancel` fires or every
    /// handle has been dropped.
    pub fn spawn(
        state: PatientState,
        config: &MonitorConfig,
        services: MonitorServices,
        cancel: CancellationToken,
    ) -> (MonitorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let monitor = Self {
            state,
            sos: SosSession::default(),
            countdown: None,
            insight: None,
            sampler: VitalsSampler::new(),
            rng: StdRng::from_os_rng(),
            config: config.clone(),
            dispatcher: Arc::clone(&services.dispatcher),
            insights: services.insights.clone(),
            commands: rx,
            weak_tx: tx.downgrade(),
            cancel,
        };
        let task = tokio::spawn(monitor.run());
        (MonitorHandle::new(tx, services), task)
    }

    async fn run(mut self) {
        tracing::info!(patient = %self.state.name, "Patient monitor started");
        self.spawn_insight(None, self.state.level());

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        self.stop_countdown();
        tracing::info!(patient = %self.state.name, "Patient monitor stopped");
    }

    async fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            Command::RecordVitals => self.record_vitals(),
            Command::EvaluateCompliance { now, reply } => {
                let missed = self.evaluate_compliance(now).await;
                let _ = reply.send(missed);
            }
            Command::CountdownTick { generation } => self.countdown_tick(generation),
            Command::SetInsight { insight } => {
                tracing::debug!(category = ?insight.category, "Insight updated");
                self.insight = Some(insight);
            }

            Command::TriggerSos { kind, reply } => {
                self.trigger_sos(kind).await;
                let _ = reply.send(());
            }
            Command::RunSystemTest { reply } => {
                self.run_system_test().await;
                let _ = reply.send(());
            }
            Command::Resolve { reply } => {
                let resolved = self.resolve().await;
                let _ = reply.send(resolved);
            }

            Command::ToggleMedication { id, reply } => {
                let result = medication::toggle_taken(&mut self.state.medications, &id);
                if let Ok(taken) = result {
                    tracing::info!(medication_id = %id, taken, "Medication toggled");
                }
                let _ = reply.send(result);
            }
            Command::AddMedication { new, reply } => {
                let result = new.into_medication().map(|med| {
                    tracing::info!(medication = %med.name, scheduled = %med.scheduled_time, "Medication added");
                    self.state.medications.push(med.clone());
                    med
                });
                let _ = reply.send(result);
            }
            Command::ResetDaily { reply } => {
                medication::reset_daily(&mut self.state.medications);
                tracing::info!(count = self.state.medications.len(), "Daily medication schedule reset");
                let _ = reply.send(());
            }

            Command::AddContact { new, reply } => {
                let result = self
                    .state
                    .add_contact(new)
                    .map(|contact| (contact, self.state.profile()));
                let _ = reply.send(result);
            }
            Command::RemoveContact { id, reply } => {
                let removed = self.state.remove_contact(&id).then(|| self.state.profile());
                let _ = reply.send(removed);
            }
            Command::UpdateProfile { update, reply } => {
                let result = self
                    .state
                    .apply_profile_update(update)
                    .map(|changed| changed.then(|| self.state.profile()));
                let _ = reply.send(result);
            }
            Command::SetLocation { location, reply } => {
                tracing::debug!(address = %location.address, "Location updated");
                self.state.location = location;
                let _ = reply.send(());
            }

            Command::Patient { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot(Utc::now()));
            }
            Command::SosStatus { reply } => {
                let _ = reply.send(self.sos.phase());
            }
            Command::CurrentInsight { reply } => {
                let _ = reply.send(self.insight.clone());
            }
            Command::Adherence { reply } => {
                let _ = reply.send(self.state.adherence());
            }
            Command::Credentials { reply } => {
                let _ = reply.send(self.state.relay_credentials().cloned());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Vitals and compliance
    // -----------------------------------------------------------------------

    fn record_vitals(&mut self) {
        let sample = self.sampler.sample(&mut self.rng, self.state.level());
        self.state.apply_sample(sample, Utc::now());
        tracing::debug!(
            heart_rate = sample.heart_rate,
            systolic = sample.systolic,
            oxygen = sample.oxygen,
            status = %self.state.level(),
            "Vitals recorded"
        );
    }

    /// Raise one alert per newly overdue dose. Returns how many were raised.
    async fn evaluate_compliance(&mut self, now: ScheduleTime) -> usize {
        let report = compliance::scan(&mut self.state.medications, now);
        for id in &report.malformed {
            tracing::warn!(medication_id = %id, "Skipping medication with malformed schedule time");
        }

        let contact = self
            .state
            .primary_contact()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| DEFAULT_CONTACT.to_string());

        for missed in &report.missed {
            tracing::info!(
                medication = %missed.name,
                scheduled = %missed.scheduled,
                contact = %contact,
                "Missed dose detected"
            );
            self.state.logs.record(EmergencyLogEntry::new(
                LogKind::MedicationAlert,
                false,
                missed.log_note(&contact),
                Utc::now(),
            ));
            self.dispatcher
                .dispatch(
                    Dispatch::new()
                        .with_speech(missed.spoken_text())
                        .with_notice(
                            NotificationCategory::Messaging,
                            "Medication Reminder",
                            missed.in_app_message(),
                        )
                        .with_relay(missed.relay_text(&self.state.name)),
                    self.state.relay_credentials(),
                )
                .await;
        }

        report.missed.len()
    }

    // -----------------------------------------------------------------------
    // SOS protocol
    // -----------------------------------------------------------------------

    async fn trigger_sos(&mut self, kind: EmergencyKind) {
        if let Err(e) = self.state.status.transition(AlertLevel::Critical) {
            tracing::error!(error = %e, "Alert transition rejected");
        }
        self.state.logs.record(EmergencyLogEntry::new(
            kind.into(),
            false,
            kind.note(),
            Utc::now(),
        ));

        let opened = self
            .sos
            .open(SosMode::Emergency(kind), self.config.sos_countdown_secs);
        if let Some(previous) = opened.superseded {
            tracing::info!(previous = ?previous, "Open SOS session superseded");
        }
        self.start_countdown(opened.generation);

        tracing::warn!(
            kind = ?kind,
            patient = %self.state.name,
            countdown = self.config.sos_countdown_secs,
            "SOS triggered"
        );

        let relay = format!(
            "🚨 *SOS EMERGENCY ALERT* 🚨\n\nPatient: {}\nStatus: CRITICAL ({})\nLocation: {}\n\nPlease respond immediately.",
            self.state.name,
            kind.reason(),
            self.state.location.address,
        );
        self.dispatcher
            .dispatch(
                Dispatch::new()
                    .with_speech(kind.spoken_alert())
                    .with_notice(
                        NotificationCategory::System,
                        "CRITICAL ALERT",
                        kind.in_app_message(),
                    )
                    .with_relay(relay),
                self.state.relay_credentials(),
            )
            .await;

        self.spawn_insight(Some(self.config.insight_delay), AlertLevel::Critical);
    }

    async fn run_system_test(&mut self) {
        self.state.logs.record(EmergencyLogEntry::new(
            LogKind::SystemTest,
            true,
            SYSTEM_TEST_NOTE,
            Utc::now(),
        ));

        let opened = self.sos.open(SosMode::Test, self.config.test_countdown_secs);
        if let Some(previous) = opened.superseded {
            tracing::info!(previous = ?previous, "Open SOS session superseded by system test");
        }
        self.start_countdown(opened.generation);

        tracing::info!(countdown = self.config.test_countdown_secs, "System test started");
        self.dispatcher
            .dispatch(Dispatch::new().with_speech(SYSTEM_TEST_SPEECH), None)
            .await;
    }

    /// Close the open SOS session. Returns `false` when none was open.
    async fn resolve(&mut self) -> bool {
        let Some(mode) = self.sos.resolve() else {
            tracing::debug!("Resolve ignored, no SOS session open");
            return false;
        };
        self.stop_countdown();

        if let Err(e) = self.state.status.transition(AlertLevel::Stable) {
            tracing::error!(error = %e, "Alert transition rejected");
        }
        let acknowledged = self.state.logs.acknowledge_all();
        tracing::info!(acknowledged, test = mode.is_test(), "SOS session resolved");

        let mut dispatch = Dispatch::new().with_speech(RESOLVED_SPEECH);
        if !mode.is_test() {
            dispatch = dispatch.with_relay(format!(
                "✅ *Alert Resolved*\n\nPatient {} has cancelled the SOS alarm and marked themselves as safe.",
                self.state.name
            ));
        }
        self.dispatcher
            .dispatch(dispatch, self.state.relay_credentials())
            .await;

        if !mode.is_test() {
            self.spawn_insight(None, AlertLevel::Stable);
        }
        true
    }

    fn countdown_tick(&mut self, generation: u64) {
        match self.sos.tick(generation) {
            Some(0) => {
                tracing::info!(generation, "SOS countdown reached zero, awaiting manual resolution");
                self.stop_countdown();
            }
            Some(remaining) => tracing::debug!(generation, remaining, "SOS countdown"),
            None => tracing::debug!(generation, "Stale countdown tick ignored"),
        }
    }

    fn start_countdown(&mut self, generation: u64) {
        self.stop_countdown();
        let token = self.cancel.child_token();
        self.countdown = Some(token.clone());
        tokio::spawn(background::countdown::run(
            self.weak_tx.clone(),
            generation,
            token,
        ));
    }

    fn stop_countdown(&mut self) {
        if let Some(token) = self.countdown.take() {
            token.cancel();
        }
    }

    // -----------------------------------------------------------------------
    // Insight
    // -----------------------------------------------------------------------

    /// Request an insight reported under `status`.
    ///
    /// Without a delay the current vitals are used. With one, the vitals are
    /// re-read from the actor once the delay has elapsed. The result is
    /// posted back as [`Command::SetInsight`].
    fn spawn_insight(&self, delay: Option<Duration>, status: AlertLevel) {
        let immediate = self.state.snapshot(Utc::now()).with_status(status);
        let gateway = self.insights.clone();
        let commands = self.weak_tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let snapshot = match delay {
                None => immediate,
                Some(delay) => {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    match live_snapshot(&commands).await {
                        Some(snapshot) => snapshot.with_status(status),
                        None => return,
                    }
                }
            };

            let insight = tokio::select! {
                _ = cancel.cancelled() => return,
                insight = gateway.request(snapshot) => insight,
            };

            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::SetInsight { insight }).await;
            }
        });
    }
}

async fn live_snapshot(commands: &mpsc::WeakSender<Command>) -> Option<VitalsSnapshot> {
    let tx = commands.upgrade()?;
    let (reply, rx) = oneshot::channel();
    tx.send(Command::Snapshot { reply }).await.ok()?;
    rx.await.ok()
}
