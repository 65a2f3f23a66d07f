use thiserror::Error;

use crate::status::Status;
use crate::value::InvalidComparison;

/// Errors raised while interpreting a hook's action tree.
///
/// Interpreter failures short-circuit the whole tree; the interceptor maps
/// them onto statuses via [`HookError::into_status`].
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    InvalidComparison(#[from] InvalidComparison),

    #[error("unsupported request field path: {0}")]
    UnsupportedPath(String),

    #[error("invalid json literal: {0}")]
    JsonDecode(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    /// A status synthesized by a `ReturnError` action, or returned by the
    /// downstream handler. Passed through verbatim.
    #[error(transparent)]
    Status(#[from] Status),
}

impl HookError {
    pub fn into_status(self) -> Status {
        match self {
            HookError::Status(status) => status,
            HookError::Cancelled => Status::cancelled("request cancelled"),
            other => Status::internal(other.to_string()),
        }
    }
}
