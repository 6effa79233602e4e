use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use coxerp_blob::BlobStore;
use coxerp_kv::KVStore;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RequestConfig;
use crate::error::RequestError;
use crate::listing::{Listing, RequestFilter};
use crate::model::{
    Memo, NewRequest, ProductionRequest, RequestStatus, SerialEntry, SerialPatch,
    TransitionExtra,
};
use crate::numbering;
use crate::transitions;

const REQUEST_PREFIX: &str = "production:request:";
const ORDER_PREFIX: &str = "production:order:";
const ORDER_COUNTER: &str = "production:counter:order";
const DAY_COUNTER_PREFIX: &str = "production:counter:day:";

fn request_key(request_no: &str) -> String {
    format!("{}{}", REQUEST_PREFIX, request_no)
}

fn order_key(ordinal: u64) -> String {
    format!("{}{:020}", ORDER_PREFIX, ordinal)
}

fn encode(request: &ProductionRequest) -> Result<Vec<u8>, RequestError> {
    serde_json::to_vec(request).map_err(|e| RequestError::Storage(format!("serialize: {}", e)))
}

fn decode(bytes: &[u8]) -> Result<ProductionRequest, RequestError> {
    serde_json::from_slice(bytes).map_err(|e| RequestError::Storage(format!("deserialize: {}", e)))
}

fn check_revision(request: &ProductionRequest, expected: Option<u64>) -> Result<(), RequestError> {
    match expected {
        Some(expected) if expected != request.revision => {
            warn!(
                "stale write on {}: caller has revision {}, store has {}",
                request.request_no, expected, request.revision
            );
            Err(RequestError::StaleWrite {
                expected,
                actual: request.revision,
            })
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Owns the production requests and is the only way to change them.
///
/// Backed by an injected [`KVStore`]: `MemoryStore` for tests, `RedbStore`
/// in production. Writes go through one mutex, so a shared
/// `Arc<RequestStore>` has a single writer; callers that hold a copy across
/// a user round-trip pass its `revision` back to detect lost updates.
///
/// Every operation is all-or-nothing: changes are made on a copy that is
/// written back once, only if the whole operation succeeded.
pub struct RequestStore {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) blobs: Option<Arc<dyn BlobStore>>,
    clock: Arc<dyn Clock>,
    pub(crate) config: RequestConfig,
    writer: Mutex<()>,
}

impl RequestStore {
    /// Create a store over `kv`. Fails if `config` is unusable.
    pub fn new(kv: Arc<dyn KVStore>, config: RequestConfig) -> Result<Self, RequestError> {
        config.validate()?;
        Ok(Self {
            kv,
            blobs: None,
            clock: Arc::new(SystemClock),
            config,
            writer: Mutex::new(()),
        })
    }

    /// Keep attachment bytes in `blobs`. Without one, `attach` is refused.
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Intake
    // -----------------------------------------------------------------------

    /// Register a new request in READY and return its request number.
    pub fn create(&self, input: NewRequest) -> Result<String, RequestError> {
        let input = self.validate_new(input)?;

        let _writer = self.lock()?;
        let now = self.clock.now();

        let day_key = format!("{}{}", DAY_COUNTER_PREFIX, numbering::day_stamp(input.request_date));
        let mut seq = self.read_counter(&day_key)? + 1;
        let mut request_no =
            numbering::format_request_no(&self.config.number_prefix, input.request_date, seq);
        // Counters are advisory; the request key is the real uniqueness check.
        while self.kv.get(&request_key(&request_no))?.is_some() {
            seq += 1;
            request_no =
                numbering::format_request_no(&self.config.number_prefix, input.request_date, seq);
        }
        let ordinal = self.read_counter(ORDER_COUNTER)? + 1;

        let request = ProductionRequest {
            request_no: request_no.clone(),
            client: input.client,
            model: input.model,
            quantity: input.quantity,
            details: input.details.unwrap_or_default(),
            lens_supplier: input.lens_supplier,
            other_requests: input.other_requests.unwrap_or_default(),
            special_notes: input.special_notes.unwrap_or_default(),
            request_date: input.request_date,
            expected_date: None,
            out_date: None,
            status: RequestStatus::Ready,
            serials: Vec::new(),
            memos: Vec::new(),
            history: Vec::new(),
            attachment: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let body = encode(&request)?;
        let req_key = request_key(&request_no);
        let ord_key = order_key(ordinal);
        let ordinal_str = ordinal.to_string();
        let seq_str = seq.to_string();
        self.kv.batch_set(&[
            (req_key.as_str(), body.as_slice()),
            (ord_key.as_str(), request_no.as_bytes()),
            (ORDER_COUNTER, ordinal_str.as_bytes()),
            (day_key.as_str(), seq_str.as_bytes()),
        ])?;

        info!(
            "created production request {} ({} x{} for {})",
            request_no, request.model, request.quantity, request.client
        );
        Ok(request_no)
    }

    /// Trim and check intake fields against the configured catalogs.
    fn validate_new(&self, input: NewRequest) -> Result<NewRequest, RequestError> {
        let client = input.client.trim().to_string();
        if client.is_empty() {
            return Err(RequestError::Validation("client is required".into()));
        }

        let model = input.model.trim().to_string();
        if model.is_empty() || model == self.config.model_placeholder {
            return Err(RequestError::Validation("a product model must be selected".into()));
        }
        if !self.config.models.is_empty() && !self.config.models.contains(&model) {
            return Err(RequestError::Validation(format!("unknown model '{}'", model)));
        }

        if input.quantity == 0 {
            return Err(RequestError::Validation("quantity must be at least 1".into()));
        }
        if input.quantity > self.config.max_quantity {
            return Err(RequestError::Validation(format!(
                "quantity {} exceeds the limit of {}",
                input.quantity, self.config.max_quantity
            )));
        }

        let lens_supplier = non_blank(input.lens_supplier);
        if let Some(supplier) = &lens_supplier {
            if !self.config.lens_suppliers.is_empty()
                && !self.config.lens_suppliers.contains(supplier)
            {
                return Err(RequestError::Validation(format!(
                    "unknown lens supplier '{}'",
                    supplier
                )));
            }
        }

        Ok(NewRequest {
            client,
            model,
            quantity: input.quantity,
            request_date: input.request_date,
            details: non_blank(input.details),
            lens_supplier,
            other_requests: non_blank(input.other_requests),
            special_notes: non_blank(input.special_notes),
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Look up a request. `NotFound` if there is none with this number.
    pub fn get(&self, request_no: &str) -> Result<ProductionRequest, RequestError> {
        self.find(request_no)?
            .ok_or_else(|| RequestError::NotFound(request_no.to_string()))
    }

    /// Like `get`, but absence is `Ok(None)`.
    pub fn find(&self, request_no: &str) -> Result<Option<ProductionRequest>, RequestError> {
        match self.kv.get(&request_key(request_no))? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Requests in insertion order, optionally filtered. The sequence is
    /// lazy and can be iterated any number of times.
    pub fn list(&self, filter: RequestFilter) -> Result<Listing<'_>, RequestError> {
        let entries = self.kv.scan(ORDER_PREFIX)?;
        let mut request_nos = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let request_no = String::from_utf8(value).map_err(|_| {
                RequestError::Storage(format!("order index entry {} is not UTF-8", key))
            })?;
            request_nos.push(request_no);
        }
        debug!("listing {} production requests with {:?}", request_nos.len(), filter);
        Ok(Listing::new(self, request_nos, filter))
    }

    /// Number of requests ever created (there is no delete).
    pub fn len(&self) -> Result<usize, RequestError> {
        let count = self.read_counter(ORDER_COUNTER)?;
        usize::try_from(count).map_err(|_| RequestError::Storage("order counter overflow".into()))
    }

    pub fn is_empty(&self) -> Result<bool, RequestError> {
        Ok(self.len()? == 0)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Change status along an allowed edge. This is the only way `status`
    /// is ever written.
    pub fn transition(
        &self,
        request_no: &str,
        target: RequestStatus,
        extra: TransitionExtra,
    ) -> Result<ProductionRequest, RequestError> {
        let (request, from) = self.mutate(request_no, |request, now| {
            check_revision(request, extra.expected_revision)?;
            let from = request.status;
            if let Err(e) = transitions::apply(request, target, &extra, now) {
                warn!("rejected {} -> {} on {}: {}", from, target, request_no, e);
                return Err(e);
            }
            Ok(from)
        })?;
        info!("{}: {} -> {}", request_no, from, target);
        Ok(request)
    }

    /// Give the request `quantity` blank serial rows if it has none yet.
    /// Returns whether rows were added; calling it again is a no-op.
    pub fn initialize_serials(&self, request_no: &str) -> Result<bool, RequestError> {
        let (_, added) = self.mutate(request_no, |request, _| Ok(request.materialize_serials()))?;
        if added {
            debug!("{}: serial table materialized", request_no);
        } else {
            debug!("{}: serial table already present", request_no);
        }
        Ok(added)
    }

    /// Patch the serial row at `seq` (1-based). Rows are never added or removed.
    pub fn update_serial(
        &self,
        request_no: &str,
        seq: u32,
        patch: SerialPatch,
    ) -> Result<SerialEntry, RequestError> {
        let (_, entry) = self.mutate(request_no, |request, _| {
            check_revision(request, patch.expected_revision)?;
            if seq == 0 || seq > request.quantity {
                return Err(RequestError::OutOfRange {
                    seq,
                    quantity: request.quantity,
                });
            }
            if request.status == RequestStatus::Done {
                return Err(RequestError::Validation(format!(
                    "{} is {}; re-open it before editing serials",
                    request_no,
                    RequestStatus::Done
                )));
            }
            if request.serials.is_empty() {
                return Err(RequestError::Validation(format!(
                    "{} has no serial table yet",
                    request_no
                )));
            }
            let idx = (seq - 1) as usize;
            let entry = &mut request.serials[idx];
            patch.apply_to(entry);
            Ok(entry.clone())
        })?;
        debug!("{}: serial {} updated", request_no, seq);
        Ok(entry)
    }

    /// Finish production: every serial row needs a serial number, then the
    /// request moves to DONE with `out_date`.
    pub fn finalize(
        &self,
        request_no: &str,
        out_date: NaiveDate,
    ) -> Result<ProductionRequest, RequestError> {
        let (request, ()) = self.mutate(request_no, |request, now| {
            let missing = request.missing_serials();
            if !missing.is_empty() {
                warn!("{}: cannot finalize, serials missing for {:?}", request_no, missing);
                return Err(RequestError::IncompleteSerials { missing });
            }
            transitions::apply(request, RequestStatus::Done, &TransitionExtra::out(out_date), now)
        })?;
        info!("{}: finalized, out {}", request_no, out_date);
        Ok(request)
    }

    /// Append a memo. Memos are never edited or removed.
    pub fn add_memo(
        &self,
        request_no: &str,
        author: &str,
        content: &str,
    ) -> Result<Memo, RequestError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RequestError::Validation("memo content is empty".into()));
        }
        let (_, memo) = self.mutate(request_no, |request, now| {
            // Keep timestamps non-decreasing even if the clock steps back.
            let timestamp = match request.memos.last() {
                Some(last) if last.timestamp > now => last.timestamp,
                _ => now,
            };
            let memo = Memo {
                author: author.trim().to_string(),
                content: content.to_string(),
                timestamp,
            };
            request.memos.push(memo.clone());
            Ok(memo)
        })?;
        debug!("{}: memo added by {:?}", request_no, memo.author);
        Ok(memo)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> Result<MutexGuard<'_, ()>, RequestError> {
        self.writer
            .lock()
            .map_err(|_| RequestError::Storage("request store writer lock poisoned".into()))
    }

    fn read_counter(&self, key: &str) -> Result<u64, RequestError> {
        match self.kv.get(key)? {
            None => Ok(0),
            Some(bytes) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| RequestError::Storage(format!("counter {} is corrupt", key))),
        }
    }

    /// Read-modify-write under the writer lock. `f` edits a copy; the copy is
    /// stored (with a bumped revision) only if `f` succeeds and changed it.
    pub(crate) fn mutate<T, F>(
        &self,
        request_no: &str,
        f: F,
    ) -> Result<(ProductionRequest, T), RequestError>
    where
        F: FnOnce(&mut ProductionRequest, DateTime<Utc>) -> Result<T, RequestError>,
    {
        let _writer = self.lock()?;
        let original = self.get(request_no)?;
        let mut request = original.clone();
        let now = self.clock.now();

        let out = f(&mut request, now)?;

        if request != original {
            request.revision = original.revision + 1;
            request.updated_at = now.max(original.updated_at);
            self.kv.set(&request_key(request_no), &encode(&request)?)?;
        }
        Ok((request, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use coxerp_kv::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> RequestStore {
        RequestStore::new(Arc::new(MemoryStore::new()), RequestConfig::default()).unwrap()
    }

    fn acme(quantity: u32) -> NewRequest {
        NewRequest::new("Acme", "M1", quantity, date(2024, 11, 25))
    }

    fn started(store: &RequestStore, quantity: u32) -> String {
        let no = store.create(acme(quantity)).unwrap();
        store
            .transition(&no, RequestStatus::InProduction, TransitionExtra::expected(date(2024, 12, 1)))
            .unwrap();
        no
    }

    #[test]
    fn create_starts_ready_and_empty() {
        let store = store();
        let no = store.create(acme(3)).unwrap();
        assert_eq!(no, "REQ-20241125-001");

        let req = store.get(&no).unwrap();
        assert_eq!(req.status, RequestStatus::Ready);
        assert!(req.serials.is_empty());
        assert!(req.memos.is_empty());
        assert_eq!(req.revision, 0);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn request_numbers_unique_per_day() {
        let store = store();
        let a = store.create(acme(1)).unwrap();
        let b = store.create(acme(1)).unwrap();
        let c = store
            .create(NewRequest::new("Acme", "M1", 1, date(2024, 11, 26)))
            .unwrap();
        assert_eq!(a, "REQ-20241125-001");
        assert_eq!(b, "REQ-20241125-002");
        assert_eq!(c, "REQ-20241126-001");
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn create_skips_numbers_already_taken() {
        let kv = Arc::new(MemoryStore::new());
        kv.set("production:request:REQ-20241125-001", b"{}").unwrap();
        let store = RequestStore::new(kv, RequestConfig::default()).unwrap();
        assert_eq!(store.create(acme(1)).unwrap(), "REQ-20241125-002");
    }

    #[test]
    fn create_validation() {
        let store = store();
        let bad = [
            NewRequest::new("  ", "M1", 1, date(2024, 11, 25)),
            NewRequest::new("Acme", "", 1, date(2024, 11, 25)),
            NewRequest::new("Acme", "선택하세요", 1, date(2024, 11, 25)),
            NewRequest::new("Acme", "M1", 0, date(2024, 11, 25)),
            NewRequest::new("Acme", "M1", 10_001, date(2024, 11, 25)),
        ];
        for input in bad {
            let err = store.create(input.clone()).unwrap_err();
            assert!(matches!(err, RequestError::Validation(_)), "{:?} -> {:?}", input, err);
        }
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn create_checks_catalogs() {
        let config = RequestConfig {
            models: vec!["MODEL-A (Standard)".into(), "MODEL-B (Pro)".into()],
            lens_suppliers: vec!["자사".into(), "공급사 A".into()],
            ..Default::default()
        };
        let store = RequestStore::new(Arc::new(MemoryStore::new()), config).unwrap();

        let err = store.create(acme(1)).unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));

        let err = store
            .create(NewRequest::new("Acme", "MODEL-A (Standard)", 1, date(2024, 11, 25)).lens_supplier("공급사 Z"))
            .unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));

        let no = store
            .create(NewRequest::new("Acme", "MODEL-A (Standard)", 1, date(2024, 11, 25)).lens_supplier("자사"))
            .unwrap();
        assert_eq!(store.get(&no).unwrap().lens_supplier.as_deref(), Some("자사"));
    }

    #[test]
    fn create_trims_optional_text() {
        let store = store();
        let no = store
            .create(acme(1).details("  - coating A\n").special_notes("   ").lens_supplier(""))
            .unwrap();
        let req = store.get(&no).unwrap();
        assert_eq!(req.details, "- coating A");
        assert_eq!(req.special_notes, "");
        assert_eq!(req.lens_supplier, None);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = store();
        assert_eq!(
            store.get("REQ-20991231-001").unwrap_err(),
            RequestError::NotFound("REQ-20991231-001".into())
        );
        assert_eq!(store.find("REQ-20991231-001").unwrap(), None);
    }

    #[test]
    fn rejected_transition_leaves_request_untouched() {
        let store = store();
        let no = store.create(acme(2)).unwrap();
        let before = store.get(&no).unwrap();

        let err = store
            .transition(&no, RequestStatus::Done, TransitionExtra::out(date(2024, 12, 5)))
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::InvalidTransition {
                from: RequestStatus::Ready,
                to: RequestStatus::Done
            }
        );
        assert_eq!(store.get(&no).unwrap(), before);
    }

    #[test]
    fn transitions_bump_revision_and_log_history() {
        let store = store();
        let no = started(&store, 1);
        let req = store
            .transition(&no, RequestStatus::Hold, TransitionExtra::default())
            .unwrap();
        assert_eq!(req.revision, 2);
        let path: Vec<_> = req.history.iter().map(|h| (h.from, h.to)).collect();
        assert_eq!(
            path,
            vec![
                (RequestStatus::Ready, RequestStatus::InProduction),
                (RequestStatus::InProduction, RequestStatus::Hold),
            ]
        );
        assert_eq!(store.get(&no).unwrap(), req);
    }

    #[test]
    fn expected_date_on_hold_is_rejected_and_nothing_written() {
        let store = store();
        let no = started(&store, 1);
        let before = store.get(&no).unwrap();
        let err = store
            .transition(&no, RequestStatus::Hold, TransitionExtra::expected(date(2025, 1, 5)))
            .unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        assert_eq!(store.get(&no).unwrap(), before);
    }

    #[test]
    fn stale_revision_rejected() {
        let store = store();
        let no = started(&store, 2);
        let seen = store.get(&no).unwrap().revision;

        store
            .update_serial(&no, 1, SerialPatch::default().serial_no("SN1").at_revision(seen))
            .unwrap();

        let before = store.get(&no).unwrap();
        let err = store
            .update_serial(&no, 2, SerialPatch::default().serial_no("SN2").at_revision(seen))
            .unwrap_err();
        assert_eq!(
            err,
            RequestError::StaleWrite {
                expected: seen,
                actual: seen + 1
            }
        );
        let err = store
            .transition(&no, RequestStatus::Hold, TransitionExtra::default().at_revision(seen))
            .unwrap_err();
        assert!(matches!(err, RequestError::StaleWrite { .. }));
        assert_eq!(store.get(&no).unwrap(), before);
    }

    #[test]
    fn initialize_serials_twice_keeps_quantity() {
        let store = store();
        let no = store.create(acme(3)).unwrap();
        assert!(store.initialize_serials(&no).unwrap());
        let rev = store.get(&no).unwrap().revision;
        assert!(!store.initialize_serials(&no).unwrap());

        let req = store.get(&no).unwrap();
        assert_eq!(req.serials.len(), 3);
        // The no-op call wrote nothing.
        assert_eq!(req.revision, rev);
    }

    #[test]
    fn update_serial_bounds_and_shape() {
        let store = store();
        let no = started(&store, 3);

        for seq in [0, 4, 100] {
            let err = store
                .update_serial(&no, seq, SerialPatch::default().serial_no("X"))
                .unwrap_err();
            assert_eq!(err, RequestError::OutOfRange { seq, quantity: 3 });
        }

        let entry = store
            .update_serial(&no, 2, SerialPatch::default().serial_no("SN002").completed(true))
            .unwrap();
        assert_eq!(entry.seq, 2);
        assert!(entry.completed);

        let req = store.get(&no).unwrap();
        let seqs: Vec<u32> = req.serials.iter().map(|s| s.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(req.serial(2).unwrap().serial_no, "SN002");
        assert_eq!(req.completed_count(), 1);
    }

    #[test]
    fn update_serial_needs_table_and_open_request() {
        let store = store();
        let no = store.create(acme(1)).unwrap();
        let err = store
            .update_serial(&no, 1, SerialPatch::default().serial_no("X"))
            .unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));

        let no = started(&store, 1);
        store
            .update_serial(&no, 1, SerialPatch::default().serial_no("SN1"))
            .unwrap();
        store.finalize(&no, date(2024, 12, 5)).unwrap();
        let err = store
            .update_serial(&no, 1, SerialPatch::default().serial_no(""))
            .unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        assert_eq!(store.get(&no).unwrap().serials[0].serial_no, "SN1");
    }

    #[test]
    fn finalize_reports_missing_seqs() {
        let store = store();
        let no = started(&store, 3);
        store
            .update_serial(&no, 2, SerialPatch::default().serial_no("SN002").completed(true))
            .unwrap();

        let err = store.finalize(&no, date(2024, 12, 5)).unwrap_err();
        assert_eq!(err, RequestError::IncompleteSerials { missing: vec![1, 3] });

        let req = store.get(&no).unwrap();
        assert_eq!(req.status, RequestStatus::InProduction);
        assert_eq!(req.out_date, None);
    }

    #[test]
    fn finalize_on_ready_lists_every_seq() {
        let store = store();
        let no = store.create(acme(2)).unwrap();
        let err = store.finalize(&no, date(2024, 12, 5)).unwrap_err();
        assert_eq!(err, RequestError::IncompleteSerials { missing: vec![1, 2] });
    }

    #[test]
    fn finalize_from_hold_is_invalid_transition() {
        let store = store();
        let no = started(&store, 1);
        store
            .update_serial(&no, 1, SerialPatch::default().serial_no("SN1"))
            .unwrap();
        store
            .transition(&no, RequestStatus::Hold, TransitionExtra::default())
            .unwrap();
        let err = store.finalize(&no, date(2024, 12, 5)).unwrap_err();
        assert_eq!(
            err,
            RequestError::InvalidTransition {
                from: RequestStatus::Hold,
                to: RequestStatus::Done
            }
        );
    }

    #[test]
    fn memos_append_in_order_with_monotonic_time() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let store = store().with_clock(clock.clone());
        let no = store.create(acme(1)).unwrap();

        store.add_memo(&no, "kim", "first").unwrap();
        clock.advance(Duration::minutes(1));
        store.add_memo(&no, "lee", "second").unwrap();
        // Clock steps backwards; the log must not.
        clock.set(start - Duration::hours(1));
        let third = store.add_memo(&no, "park", "third").unwrap();
        assert_eq!(third.timestamp, start + Duration::minutes(1));

        let req = store.get(&no).unwrap();
        let contents: Vec<_> = req.memos.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(req.memos.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(req.status, RequestStatus::Ready);
    }

    #[test]
    fn empty_memo_rejected() {
        let store = store();
        let no = store.create(acme(1)).unwrap();
        let err = store.add_memo(&no, "kim", "   ").unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        assert!(store.get(&no).unwrap().memos.is_empty());

        let err = store.add_memo("REQ-NOPE", "kim", "hello").unwrap_err();
        assert!(matches!(err, RequestError::NotFound(_)));
    }

    #[test]
    fn bad_config_rejected_at_construction() {
        let config = RequestConfig {
            number_prefix: String::new(),
            ..Default::default()
        };
        assert!(RequestStore::new(Arc::new(MemoryStore::new()), config).is_err());
    }
}
