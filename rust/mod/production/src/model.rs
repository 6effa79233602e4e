use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a production request.
///
/// ```text
/// READY → IN_PRODUCTION ⇄ HOLD
///                       ⇄ STOPPED
///                       ⇄ DONE
/// ```
///
/// There is no terminal state: a DONE request can be re-opened for
/// corrections. See [`crate::transitions`] for the edge rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Ready,
    InProduction,
    Hold,
    Stopped,
    Done,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        Self::Ready,
        Self::InProduction,
        Self::Hold,
        Self::Stopped,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::InProduction => "IN_PRODUCTION",
            Self::Hold => "HOLD",
            Self::Stopped => "STOPPED",
            Self::Done => "DONE",
        }
    }

    /// Label shown on the shop floor.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "준비",
            Self::InProduction => "생산중",
            Self::Hold => "대기",
            Self::Stopped => "중지",
            Self::Done => "완료",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = RequestError;

    /// Accepts `IN_PRODUCTION`, `InProduction`, `in-production` and the
    /// floor label `생산중`. Anything else is a validation error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(status) = Self::ALL.iter().find(|st| st.label() == trimmed) {
            return Ok(*status);
        }
        let folded: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "ready" => Ok(Self::Ready),
            "inproduction" => Ok(Self::InProduction),
            "hold" => Ok(Self::Hold),
            "stopped" => Ok(Self::Stopped),
            "done" => Ok(Self::Done),
            _ => Err(RequestError::Validation(format!(
                "unknown status '{}'",
                trimmed
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rows owned by a request
// ---------------------------------------------------------------------------

/// One physical unit's row in a request's serial table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialEntry {
    /// 1-based position; fixed for the life of the row.
    pub seq: u32,
    #[serde(default)]
    pub serial_no: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub completed: bool,
}

impl SerialEntry {
    pub fn blank(seq: u32) -> Self {
        Self {
            seq,
            serial_no: String::new(),
            note: String::new(),
            completed: false,
        }
    }

    pub fn has_serial_no(&self) -> bool {
        !self.serial_no.trim().is_empty()
    }
}

/// A timestamped note on a request. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit row written by every successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub at: DateTime<Utc>,
}

/// Reference to a file kept in a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    /// Blob store key.
    pub reference: String,
}

// ---------------------------------------------------------------------------
// ProductionRequest
// ---------------------------------------------------------------------------

/// One production order tracked from intake to shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRequest {
    pub request_no: String,

    // --- intake ---
    pub client: String,
    pub model: String,
    pub quantity: u32,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_supplier: Option<String>,
    #[serde(default)]
    pub other_requests: String,
    /// Admin-only remarks.
    #[serde(default)]
    pub special_notes: String,

    // --- schedule ---
    pub request_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_date: Option<NaiveDate>,

    // --- progress ---
    pub status: RequestStatus,
    #[serde(default)]
    pub serials: Vec<SerialEntry>,
    #[serde(default)]
    pub memos: Vec<Memo>,
    #[serde(default)]
    pub history: Vec<StatusChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,

    // --- bookkeeping ---
    /// Bumped on every change; callers pass it back as `expected_revision`.
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductionRequest {
    /// Seq numbers that still lack a serial number, ascending.
    /// Before the table is materialized every seq counts as missing.
    pub fn missing_serials(&self) -> Vec<u32> {
        if self.serials.is_empty() {
            return (1..=self.quantity).collect();
        }
        self.serials
            .iter()
            .filter(|s| !s.has_serial_no())
            .map(|s| s.seq)
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.serials.iter().filter(|s| s.completed).count()
    }

    pub fn serial(&self, seq: u32) -> Option<&SerialEntry> {
        let idx = usize::try_from(seq).ok()?.checked_sub(1)?;
        self.serials.get(idx)
    }

    /// Fill `serials` with `quantity` blank rows. Returns false (and leaves
    /// the table alone) when it is already populated.
    pub(crate) fn materialize_serials(&mut self) -> bool {
        if !self.serials.is_empty() {
            return false;
        }
        self.serials = (1..=self.quantity).map(SerialEntry::blank).collect();
        true
    }
}

// ---------------------------------------------------------------------------
// Caller-facing inputs
// ---------------------------------------------------------------------------

/// Intake form for a new request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub client: String,
    pub model: String,
    pub quantity: u32,
    pub request_date: NaiveDate,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub lens_supplier: Option<String>,
    #[serde(default)]
    pub other_requests: Option<String>,
    #[serde(default)]
    pub special_notes: Option<String>,
}

impl NewRequest {
    pub fn new(
        client: impl Into<String>,
        model: impl Into<String>,
        quantity: u32,
        request_date: NaiveDate,
    ) -> Self {
        Self {
            client: client.into(),
            model: model.into(),
            quantity,
            request_date,
            details: None,
            lens_supplier: None,
            other_requests: None,
            special_notes: None,
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn lens_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.lens_supplier = Some(supplier.into());
        self
    }

    pub fn other_requests(mut self, text: impl Into<String>) -> Self {
        self.other_requests = Some(text.into());
        self
    }

    pub fn special_notes(mut self, text: impl Into<String>) -> Self {
        self.special_notes = Some(text.into());
        self
    }
}

/// Status-dependent fields supplied with a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionExtra {
    /// Required when leaving READY; optional on other moves into IN_PRODUCTION,
    /// rejected on every other edge.
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    /// Required on the move into DONE, rejected elsewhere.
    #[serde(default)]
    pub out_date: Option<NaiveDate>,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

impl TransitionExtra {
    pub fn expected(date: NaiveDate) -> Self {
        Self {
            expected_date: Some(date),
            ..Default::default()
        }
    }

    pub fn out(date: NaiveDate) -> Self {
        Self {
            out_date: Some(date),
            ..Default::default()
        }
    }

    pub fn at_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}

/// Partial update of one serial row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialPatch {
    #[serde(default)]
    pub serial_no: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

impl SerialPatch {
    pub fn serial_no(mut self, serial_no: impl Into<String>) -> Self {
        self.serial_no = Some(serial_no.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn at_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }

    pub(crate) fn apply_to(&self, entry: &mut SerialEntry) {
        if let Some(serial_no) = &self.serial_no {
            entry.serial_no = serial_no.trim().to_string();
        }
        if let Some(note) = &self.note {
            entry.note = note.trim().to_string();
        }
        if let Some(completed) = self.completed {
            entry.completed = completed;
        }
    }
}
