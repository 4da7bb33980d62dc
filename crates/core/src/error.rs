use crate::alert::AlertLevel;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid alert transition: {from} -> {to}")]
    InvalidTransition { from: AlertLevel, to: AlertLevel },

    #[error("Internal error: {0}")]
    Internal(String),
}
