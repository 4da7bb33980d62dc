//! Session lifecycle: hydrate, start every task, end them together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitalwatch_core::medication::Medication;
use vitalwatch_core::patient::{PatientProfile, PatientState};
use vitalwatch_events::{
    EventBus, MessageRelay, NotificationDispatcher, SpeechOutput, TelegramRelay, TracingSpeech,
};

use crate::actor::{MonitorServices, PatientMonitor};
use crate::background::{self, compliance::LocalClock, compliance::WallClock};
use crate::config::MonitorConfig;
use crate::geocode::{Geocoder, NominatimGeocoder};
use crate::handle::MonitorHandle;
use crate::insight::{GeminiInsightGenerator, InsightGateway, InsightGenerator};
use crate::profile::{JsonProfileStore, ProfileStore};

/// How long [`Session::end`] waits for each task after cancelling.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

/// External collaborators a session runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub speech: Arc<dyn SpeechOutput>,
    pub relay: Arc<dyn MessageRelay>,
    pub insights: InsightGateway,
    pub geocoder: Arc<dyn Geocoder>,
    pub store: Arc<dyn ProfileStore>,
    pub clock: Arc<dyn WallClock>,
}

impl Collaborators {
    /// Production wiring. The Gemini generator is only enabled when an API
    /// key is configured.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let generator = config.gemini_api_key.as_ref().map(|key| {
            Arc::new(GeminiInsightGenerator::new(key.clone(), config.gemini_model.clone()))
                as Arc<dyn InsightGenerator>
        });
        Self {
            speech: Arc::new(TracingSpeech::new()),
            relay: Arc::new(TelegramRelay::new(config.telegram_api_url.clone())),
            insights: InsightGateway::new(generator),
            geocoder: Arc::new(NominatimGeocoder::new(config.geocoder_url.clone())),
            store: Arc::new(JsonProfileStore::new(config.profile_path.clone())),
            clock: Arc::new(LocalClock),
        }
    }
}

/// A running monitoring session.
///
/// Owns the actor, the vitals and compliance tickers, and the root
/// [`CancellationToken`] that countdown and insight tasks are children of.
pub struct Session {
    handle: MonitorHandle,
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    config: MonitorConfig,
    collaborators: Collaborators,
}

impl Session {
    /// Start monitoring `profile`. Must be called from within a tokio
    /// runtime.
    pub fn start(
        config: MonitorConfig,
        profile: PatientProfile,
        medications: Vec<Medication>,
        collaborators: Collaborators,
    ) -> Self {
        tracing::info!(
            patient_id = %profile.id,
            patient = %profile.name,
            medications = medications.len(),
            "Starting monitoring session"
        );

        let cancel = CancellationToken::new();
        let state = PatientState::new(profile, medications, config.history_window, Utc::now());

        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::clone(&collaborators.speech),
            Arc::clone(&collaborators.relay),
            Arc::new(EventBus::default()),
            config.notification_queue_capacity,
        ));
        let services = MonitorServices {
            dispatcher,
            insights: collaborators.insights.clone(),
            geocoder: Arc::clone(&collaborators.geocoder),
            store: Arc::clone(&collaborators.store),
        };

        let (handle, actor) = PatientMonitor::spawn(state, &config, services, cancel.clone());

        let vitals = tokio::spawn(background::vitals::run(
            handle.clone(),
            config.vitals_interval,
            cancel.child_token(),
        ));
        let compliance = tokio::spawn(background::compliance::run(
            handle.clone(),
            Arc::clone(&collaborators.clock),
            config.compliance_interval,
            cancel.child_token(),
        ));

        Self {
            handle,
            cancel,
            tasks: vec![("monitor", actor), ("vitals", vitals), ("compliance", compliance)],
            config,
            collaborators,
        }
    }

    /// Start a session for the stored profile, or for `default_profile` when
    /// the store is empty or unreadable. A default that gets used is saved.
    pub async fn hydrate(
        config: MonitorConfig,
        default_profile: PatientProfile,
        medications: Vec<Medication>,
        collaborators: Collaborators,
    ) -> Self {
        let profile = match collaborators.store.load().await {
            Ok(Some(profile)) => {
                tracing::info!(patient_id = %profile.id, "Loaded stored profile");
                profile
            }
            Ok(None) => {
                tracing::info!("No stored profile, using default");
                if let Err(e) = collaborators.store.save(&default_profile).await {
                    tracing::warn!(error = %e, "Failed to save default profile");
                }
                default_profile
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load profile, using default");
                default_profile
            }
        };
        Self::start(config, profile, medications, collaborators)
    }

    pub fn handle(&self) -> &MonitorHandle {
        &self.handle
    }

    /// End this session and start a fresh one for `profile` with the same
    /// configuration and collaborators.
    pub async fn supersede(self, profile: PatientProfile, medications: Vec<Medication>) -> Self {
        let config = self.config.clone();
        let collaborators = self.collaborators.clone();
        self.end().await;
        Self::start(config, profile, medications, collaborators)
    }

    /// Cancel every task and wait for each to finish, up to a bounded time.
    pub async fn end(self) {
        tracing::info!("Ending monitoring session");
        self.cancel.cancel();

        for (name, task) in self.tasks {
            match tokio::time::timeout(SHUTDOWN_WAIT, task).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Task stopped"),
                Ok(Err(e)) => tracing::error!(task = name, error = %e, "Task failed"),
                Err(_) => tracing::warn!(task = name, "Task did not stop in time"),
            }
        }

        tracing::info!("Monitoring session ended");
    }
}
