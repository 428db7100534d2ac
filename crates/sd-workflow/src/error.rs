use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy surfaced by transition operations. The presentation layer
/// translates these to user-facing messages / HTTP statuses; the core never
/// does.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Actor lacks the role or ownership the operation requires.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// State-machine precondition violated, or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{0} not found: {1}")]
    NotFound(&'static str, Uuid),

    /// Infrastructure failure below the engine (connection, query, mapping).
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl WorkflowError {
    pub fn is_authorization(&self) -> bool {
        matches!(self, WorkflowError::Authorization(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::NotFound(_, _))
    }
}
