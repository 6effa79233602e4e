use coxerp_blob::BlobError;
use coxerp_core::ServiceError;
use coxerp_kv::KVError;
use thiserror::Error;

use crate::model::RequestStatus;

/// Every failure a `RequestStore` operation can report.
///
/// All variants are recoverable. A failed operation leaves the stored
/// request exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Bad input shape or value.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("production request '{0}' not found")]
    NotFound(String),

    /// The status edge is not in the transition table.
    #[error("cannot move request from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("serial seq {seq} is out of range 1..={quantity}")]
    OutOfRange { seq: u32, quantity: u32 },

    /// Finishing needs a serial number on every row.
    #[error("serial numbers missing for seq {missing:?}")]
    IncompleteSerials { missing: Vec<u32> },

    /// The caller's revision no longer matches the stored one.
    #[error("stale write: expected revision {expected}, current revision is {actual}")]
    StaleWrite { expected: u64, actual: u64 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<KVError> for RequestError {
    fn from(e: KVError) -> Self {
        RequestError::Storage(e.to_string())
    }
}

impl From<BlobError> for RequestError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::InvalidKey(key) => {
                RequestError::Validation(format!("invalid attachment name: {:?}", key))
            }
            other => RequestError::Storage(other.to_string()),
        }
    }
}

impl From<RequestError> for ServiceError {
    fn from(e: RequestError) -> Self {
        let msg = e.to_string();
        match e {
            RequestError::Validation(_) | RequestError::OutOfRange { .. } => {
                ServiceError::Validation(msg)
            }
            RequestError::NotFound(_) => ServiceError::NotFound(msg),
            RequestError::InvalidTransition { .. } | RequestError::IncompleteSerials { .. } => {
                ServiceError::FailedPrecondition(msg)
            }
            RequestError::StaleWrite { .. } => ServiceError::StaleWrite(msg),
            RequestError::Storage(_) => ServiceError::Storage(msg),
        }
    }
}
