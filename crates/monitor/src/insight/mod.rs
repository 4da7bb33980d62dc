//! Insight requests against an external text generator.
//!
//! [`InsightGateway::request`] never fails: a missing generator or a
//! generator error yields the canned status-derived message from
//! [`vitalwatch_core::insight::fallback`].

pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use vitalwatch_core::insight::{fallback, Insight};
use vitalwatch_core::patient::VitalsSnapshot;

pub use gemini::GeminiInsightGenerator;

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Insight service returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Insight response contained no text")]
    EmptyResponse,
}

/// External collaborator producing an [`Insight`] from a vitals snapshot.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(&self, snapshot: &VitalsSnapshot) -> Result<Insight, InsightError>;
}

/// Wraps an optional [`InsightGenerator`] with the fallback contract.
#[derive(Clone, Default)]
pub struct InsightGateway {
    generator: Option<Arc<dyn InsightGenerator>>,
}

impl InsightGateway {
    pub fn new(generator: Option<Arc<dyn InsightGenerator>>) -> Self {
        Self { generator }
    }

    /// Gateway with no generator; every request returns the fallback.
    pub fn offline() -> Self {
        Self::default()
    }

    pub async fn request(&self, snapshot: VitalsSnapshot) -> Insight {
        let Some(generator) = &self.generator else {
            tracing::debug!(status = %snapshot.status, "No insight generator configured, using fallback");
            return fallback(snapshot.status, Utc::now());
        };
        match generator.generate(&snapshot).await {
            Ok(insight) => insight,
            Err(e) => {
                tracing::warn!(error = %e, status = %snapshot.status, "Insight generation failed, using fallback");
                fallback(snapshot.status, Utc::now())
            }
        }
    }
}
