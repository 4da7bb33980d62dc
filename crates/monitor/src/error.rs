use vitalwatch_core::error::CoreError;

/// Errors returned by [`MonitorHandle`](crate::MonitorHandle) operations
/// and session setup.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The actor task has exited; the session is over.
    #[error("Monitor is not running")]
    ActorStopped,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
