use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Renderers match on these —
// never on the human-readable message string.

/// Stable error code constants.
///
/// A renderer receives `{"code": "NOT_FOUND", "message": "..."}` and should
/// branch on `code`. Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STALE_WRITE: &str = "STALE_WRITE";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const FAILED_PRECONDITION: &str = "FAILED_PRECONDITION";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified error type surfaced to renderers by every module.
///
/// Module-specific errors (e.g. the production module's `RequestError`)
/// convert into this so a front end only has to understand one shape:
///
/// ```json
/// {"code": "FAILED_PRECONDITION", "message": "cannot move REQ-20241125-001 from READY to DONE"}
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Caller acted on an outdated copy of the resource.
    #[error("{0}")]
    StaleWrite(String),

    /// Input data is invalid.
    #[error("{0}")]
    Validation(String),

    /// Input is well-formed but the resource is not in a state that allows it.
    #[error("{0}")]
    FailedPrecondition(String),

    /// Storage backend failure.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::StaleWrite(_) => error_code::STALE_WRITE,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::FailedPrecondition(_) => error_code::FAILED_PRECONDITION,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// Whether retrying the same call after re-fetching could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::StaleWrite(_) | ServiceError::Storage(_))
    }

    /// JSON body a renderer shows to the user.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        })
    }
}
