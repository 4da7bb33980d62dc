//! Durable patient profile storage.
//!
//! The session reads the profile once at start and writes it back whenever
//! identity, credentials, or contacts change. Store failures are logged by
//! the caller and never interrupt monitoring.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vitalwatch_core::patient::PatientProfile;

#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("Profile I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Profile is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The stored profile, or `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<PatientProfile>, ProfileStoreError>;
    async fn save(&self, profile: &PatientProfile) -> Result<(), ProfileStoreError>;
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn load(&self) -> Result<Option<PatientProfile>, ProfileStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, profile: &PatientProfile) -> Result<(), ProfileStoreError> {
        let bytes = serde_json::to_vec_pretty(profile)?;
        // Atomic replace.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "Profile saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryProfileStore {
    profile: RwLock<Option<PatientProfile>>,
}

impl InMemoryProfileStore {
    pub fn new(profile: Option<PatientProfile>) -> Self {
        Self {
            profile: RwLock::new(profile),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self) -> Result<Option<PatientProfile>, ProfileStoreError> {
        Ok(self.profile.read().await.clone())
    }

    async fn save(&self, profile: &PatientProfile) -> Result<(), ProfileStoreError> {
        *self.profile.write().await = Some(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PatientProfile {
        PatientProfile {
            id: "PT-1".into(),
            name: "Margaret Thompson".into(),
            age: 72,
            phone_number: None,
            relay: None,
            contacts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn json_store_round_trips_and_reports_missing() {
        let path = std::env::temp_dir().join(format!(
            "vitalwatch-profile-{}.json",
            vitalwatch_core::types::new_id()
        ));
        let store = JsonProfileStore::new(&path);

        assert!(store.load().await.unwrap().is_none());

        store.save(&profile()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(profile()));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn json_store_rejects_garbage() {
        let path = std::env::temp_dir().join(format!(
            "vitalwatch-garbage-{}.json",
            vitalwatch_core::types::new_id()
        ));
        tokio::fs::write(&path, b"not json").await.unwrap();

        let result = JsonProfileStore::new(&path).load().await;
        assert!(matches!(result, Err(ProfileStoreError::Json(_))));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_store_keeps_last_save() {
        let store = InMemoryProfileStore::default();
        assert!(store.load().await.unwrap().is_none());

        let mut updated = profile();
        updated.age = 73;
        store.save(&updated).await.unwrap();
        assert_eq!(store.load().await.unwrap().map(|p| p.age), Some(73));
    }
}
