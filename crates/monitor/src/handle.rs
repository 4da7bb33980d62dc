//! Public operations on a running monitor.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use vitalwatch_core::emergency::EmergencyKind;
use vitalwatch_core::insight::Insight;
use vitalwatch_core::medication::{AdherenceSummary, Medication, NewMedication, ScheduleTime};
use vitalwatch_core::notification::NotificationEvent;
use vitalwatch_core::patient::{
    EmergencyContact, Location, NewContact, PatientProfile, PatientState, ProfileUpdate,
    VitalsSnapshot,
};
use vitalwatch_core::sos::SosPhase;
use vitalwatch_events::NotificationDispatcher;

use crate::actor::{Command, MonitorServices};
use crate::error::MonitorError;
use crate::geocode::{resolve_address, Geocoder};
use crate::profile::ProfileStore;

/// Cloneable handle to a [`PatientMonitor`](crate::actor::PatientMonitor).
///
/// Every operation is a message to the actor; none of them hold state of
/// their own. Once the session ends they return
/// [`MonitorError::ActorStopped`].
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    dispatcher: Arc<NotificationDispatcher>,
    geocoder: Arc<dyn Geocoder>,
    store: Arc<dyn ProfileStore>,
}

impl MonitorHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, services: MonitorServices) -> Self {
        Self {
            commands,
            dispatcher: services.dispatcher,
            geocoder: services.geocoder,
            store: services.store,
        }
    }

    async fn send(&self, command: Command) -> Result<(), MonitorError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| MonitorError::ActorStopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| MonitorError::ActorStopped)
    }

    async fn persist(&self, profile: &PatientProfile) {
        if let Err(e) = self.store.save(profile).await {
            tracing::error!(error = %e, patient_id = %profile.id, "Failed to persist profile");
        }
    }

    // -----------------------------------------------------------------------
    // Ticker intents
    // -----------------------------------------------------------------------

    /// Draw and record one vitals sample.
    pub async fn record_vitals(&self) -> Result<(), MonitorError> {
        self.send(Command::RecordVitals).await
    }

    /// Scan the medication schedule at time of day `now`. Returns the number
    /// of missed-dose alerts raised.
    pub async fn evaluate_compliance(&self, now: ScheduleTime) -> Result<usize, MonitorError> {
        self.request(|reply| Command::EvaluateCompliance { now, reply })
            .await
    }

    // -----------------------------------------------------------------------
    // SOS protocol
    // -----------------------------------------------------------------------

    pub async fn trigger_sos(&self, kind: EmergencyKind) -> Result<(), MonitorError> {
        self.request(|reply| Command::TriggerSos { kind, reply }).await
    }

    pub async fn run_system_test(&self) -> Result<(), MonitorError> {
        self.request(|reply| Command::RunSystemTest { reply }).await
    }

    /// Resolve the open SOS session. `Ok(false)` when there was none.
    pub async fn resolve(&self) -> Result<bool, MonitorError> {
        self.request(|reply| Command::Resolve { reply }).await
    }

    pub async fn sos_status(&self) -> Result<SosPhase, MonitorError> {
        self.request(|reply| Command::SosStatus { reply }).await
    }

    // -----------------------------------------------------------------------
    // Medications
    // -----------------------------------------------------------------------

    /// Flip a dose's `taken` flag, returning the new value.
    pub async fn toggle_medication_taken(&self, id: &str) -> Result<bool, MonitorError> {
        let id = id.to_string();
        Ok(self
            .request(|reply| Command::ToggleMedication { id, reply })
            .await??)
    }

    pub async fn add_medication(&self, new: NewMedication) -> Result<Medication, MonitorError> {
        Ok(self
            .request(|reply| Command::AddMedication { new, reply })
            .await??)
    }

    /// Day-boundary reset of every dose. The compliance ticker never calls
    /// this.
    pub async fn reset_daily_schedule(&self) -> Result<(), MonitorError> {
        self.request(|reply| Command::ResetDaily { reply }).await
    }

    pub async fn adherence(&self) -> Result<AdherenceSummary, MonitorError> {
        self.request(|reply| Command::Adherence { reply }).await
    }

    // -----------------------------------------------------------------------
    // Profile, contacts, location
    // -----------------------------------------------------------------------

    /// Apply a profile edit and write it through to the store when anything
    /// changed. Returns whether it did.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<bool, MonitorError> {
        let changed = self
            .request(|reply| Command::UpdateProfile { update, reply })
            .await??;
        match changed {
            Some(profile) => {
                self.persist(&profile).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn add_contact(&self, new: NewContact) -> Result<EmergencyContact, MonitorError> {
        let (contact, profile) = self
            .request(|reply| Command::AddContact { new, reply })
            .await??;
        self.persist(&profile).await;
        Ok(contact)
    }

    /// Remove a contact. `Ok(false)` when the id was unknown.
    pub async fn remove_contact(&self, id: &str) -> Result<bool, MonitorError> {
        let id = id.to_string();
        match self
            .request(|reply| Command::RemoveContact { id, reply })
            .await?
        {
            Some(profile) => {
                self.persist(&profile).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Record a new position. The address is reverse geocoded first and
    /// falls back to a static string on failure.
    pub async fn update_location(&self, lat: f64, lng: f64) -> Result<Location, MonitorError> {
        let address = resolve_address(self.geocoder.as_ref(), lat, lng).await;
        let location = Location { lat, lng, address };
        let stored = location.clone();
        self.request(|reply| Command::SetLocation {
            location: stored,
            reply,
        })
        .await?;
        Ok(location)
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Send a test message through the caregiver relay and report whether
    /// it was delivered. The outcome is also spoken and queued in-app.
    pub async fn test_notification_channel(&self) -> Result<bool, MonitorError> {
        let credentials = self.request(|reply| Command::Credentials { reply }).await?;
        Ok(self.dispatcher.send_test(credentials.as_ref()).await)
    }

    /// In-app notices, newest first.
    pub async fn notifications(&self) -> Vec<NotificationEvent> {
        self.dispatcher.notifications().await
    }

    pub async fn dismiss_notification(&self, id: &str) -> bool {
        self.dispatcher.dismiss(id).await
    }

    pub async fn clear_notifications(&self) {
        self.dispatcher.clear().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.dispatcher.bus().subscribe()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// A copy of the full aggregate.
    pub async fn patient(&self) -> Result<PatientState, MonitorError> {
        self.request(|reply| Command::Patient { reply }).await
    }

    pub async fn snapshot(&self) -> Result<VitalsSnapshot, MonitorError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// The most recent insight, once the first request has completed.
    pub async fn insight(&self) -> Result<Option<Insight>, MonitorError> {
        self.request(|reply| Command::CurrentInsight { reply }).await
    }
}
