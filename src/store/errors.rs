use thiserror::Error;
use tracing::error;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A collection query matched nothing.
    #[error("no records in table")]
    NoRecords,

    /// A targeted task operation matched no task owned by the caller.
    #[error("invalid task id")]
    InvalidId,

    /// A user lookup matched nothing.
    #[error("record not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("internal store error")]
    Internal(#[source] anyhow::Error),
}

impl StoreError {
    /// Logs the underlying failure and hides it behind `Internal`.
    pub(crate) fn internal(op: &'static str, err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        error!(error = %err, op, "store operation failed");
        StoreError::Internal(err.context(op))
    }
}
