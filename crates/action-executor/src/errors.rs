use autowait_core_types::EngineError;
use nav_arbiter::WaitTrace;
use thiserror::Error;

/// Failures surfaced by [`crate::ActionExecutor::perform`].
#[derive(Debug, Error)]
pub enum PerformError {
    /// The input backend rejected or failed the dispatch itself.
    #[error("{0}")]
    Input(EngineError),
    /// The wait window ran out of budget. `message` is the rendered call log
    /// and `trace` keeps the raw steps for programmatic inspection.
    #[error("{message}")]
    Timeout { message: String, trace: WaitTrace },
    #[error("operation cancelled")]
    Cancelled,
}

impl PerformError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PerformError::Timeout { .. })
    }
}

impl From<PerformError> for EngineError {
    fn from(err: PerformError) -> Self {
        match err {
            PerformError::Input(inner) => inner,
            PerformError::Timeout { message, .. } => EngineError::new(message),
            PerformError::Cancelled => EngineError::new("operation cancelled"),
        }
    }
}
