//! Production request tracking.
//!
//! A [`RequestStore`] owns every production request: intake validation,
//! the status state machine, the per-unit serial table, the memo log and
//! an optional file attachment. Requests are persisted as JSON through a
//! [`coxerp_kv::KVStore`]; attachment bytes go to a [`coxerp_blob::BlobStore`].
//!
//! ```text
//! create ──▶ READY ──▶ IN_PRODUCTION ──▶ DONE (finalize)
//!                         │   ▲
//!                         ▼   │
//!                      HOLD / STOPPED
//! ```

mod attachment;
pub mod clock;
pub mod config;
pub mod error;
pub mod listing;
pub mod model;
pub mod numbering;
pub mod store;
pub mod transitions;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RequestConfig;
pub use error::RequestError;
pub use listing::{Listing, RequestFilter, RequestSort};
pub use model::{
    Attachment, Memo, NewRequest, ProductionRequest, RequestStatus, SerialEntry, SerialPatch,
    StatusChange, TransitionExtra,
};
pub use store::RequestStore;
