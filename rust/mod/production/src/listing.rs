use std::cmp::Ordering;
use std::str::FromStr;

use coxerp_core::{ListParams, ListResult};

use crate::error::RequestError;
use crate::model::{ProductionRequest, RequestStatus};
use crate::store::RequestStore;

/// Optional narrowing for `RequestStore::list`. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    /// Case-insensitive substring of `client`.
    pub client: Option<String>,
}

impl RequestFilter {
    pub fn status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn client(mut self, needle: impl Into<String>) -> Self {
        self.client = Some(needle.into());
        self
    }

    pub fn matches(&self, request: &ProductionRequest) -> bool {
        if let Some(status) = self.status {
            if request.status != status {
                return false;
            }
        }
        match self.client.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => request
                .client
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Explicit orderings for a listing. Without one, requests come back in
/// the order they were created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestSort {
    #[default]
    Insertion,
    RequestDate,
    /// Requests without an expected date go last.
    ExpectedDate,
    /// Lifecycle order: READY, IN_PRODUCTION, HOLD, STOPPED, DONE.
    Status,
}

impl FromStr for RequestSort {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "insertion" | "created" => Ok(Self::Insertion),
            "requestdate" => Ok(Self::RequestDate),
            "expecteddate" => Ok(Self::ExpectedDate),
            "status" => Ok(Self::Status),
            other => Err(RequestError::Validation(format!("unknown sort '{}'", other))),
        }
    }
}

impl RequestSort {
    fn compare(&self, a: &ProductionRequest, b: &ProductionRequest) -> Ordering {
        match self {
            Self::Insertion => Ordering::Equal,
            Self::RequestDate => a.request_date.cmp(&b.request_date),
            Self::ExpectedDate => match (a.expected_date, b.expected_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Status => a.status.cmp(&b.status),
        }
    }
}

/// A lazy view over the requests that existed when `list` was called.
///
/// Only the request numbers are captured up front; each request is loaded
/// when the iterator reaches it, so it reflects the latest stored state.
pub struct Listing<'a> {
    store: &'a RequestStore,
    request_nos: Vec<String>,
    filter: RequestFilter,
}

impl<'a> Listing<'a> {
    pub(crate) fn new(store: &'a RequestStore, request_nos: Vec<String>, filter: RequestFilter) -> Self {
        Self {
            store,
            request_nos,
            filter,
        }
    }

    /// Walk the snapshot from the start. May be called repeatedly.
    pub fn iter(&self) -> impl Iterator<Item = Result<ProductionRequest, RequestError>> + '_ {
        self.request_nos.iter().filter_map(move |no| match self.store.find(no) {
            Ok(Some(request)) if self.filter.matches(&request) => Some(Ok(request)),
            Ok(Some(_)) => None,
            Ok(None) => Some(Err(RequestError::Storage(format!(
                "order index points at missing request {}",
                no
            )))),
            Err(e) => Some(Err(e)),
        })
    }

    /// Load every matching request, stopping at the first storage error.
    pub fn collect(&self) -> Result<Vec<ProductionRequest>, RequestError> {
        self.iter().collect()
    }

    /// Matching requests ordered by `sort`. Ties keep insertion order.
    pub fn sorted(&self, sort: RequestSort) -> Result<Vec<ProductionRequest>, RequestError> {
        let mut all = self.collect()?;
        all.sort_by(|a, b| sort.compare(a, b));
        Ok(all)
    }

    pub fn page(
        &self,
        sort: RequestSort,
        params: &ListParams,
    ) -> Result<ListResult<ProductionRequest>, RequestError> {
        Ok(ListResult::paginate(self.sorted(sort)?, params))
    }

    /// Size of the snapshot before filtering.
    pub fn snapshot_len(&self) -> usize {
        self.request_nos.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use coxerp_kv::MemoryStore;

    use super::*;
    use crate::config::RequestConfig;
    use crate::model::{NewRequest, SerialPatch, TransitionExtra};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> RequestStore {
        RequestStore::new(Arc::new(MemoryStore::new()), RequestConfig::default()).unwrap()
    }

    fn clients(requests: &[ProductionRequest]) -> Vec<&str> {
        requests.iter().map(|r| r.client.as_str()).collect()
    }

    /// Three requests created out of date order; the second is started.
    fn seeded() -> (RequestStore, Vec<String>) {
        let store = store();
        let a = store.create(NewRequest::new("Acme", "M1", 1, date(2024, 11, 27))).unwrap();
        let b = store.create(NewRequest::new("Bolt Co", "M2", 2, date(2024, 11, 25))).unwrap();
        let c = store.create(NewRequest::new("ACME Optics", "M1", 1, date(2024, 11, 26))).unwrap();
        store
            .transition(&b, RequestStatus::InProduction, TransitionExtra::expected(date(2024, 12, 3)))
            .unwrap();
        (store, vec![a, b, c])
    }

    #[test]
    fn insertion_order_survives_status_changes() {
        let (store, nos) = seeded();
        store
            .transition(&nos[1], RequestStatus::Hold, TransitionExtra::default())
            .unwrap();
        let listing = store.list(RequestFilter::default()).unwrap();
        let all = listing.collect().unwrap();
        assert_eq!(clients(&all), vec!["Acme", "Bolt Co", "ACME Optics"]);
    }

    #[test]
    fn filters_by_status_and_client() {
        let (store, _) = seeded();

        let started = store
            .list(RequestFilter::default().status(RequestStatus::InProduction))
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(clients(&started), vec!["Bolt Co"]);

        let acme = store
            .list(RequestFilter::default().client("acme"))
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(clients(&acme), vec!["Acme", "ACME Optics"]);

        let none = store
            .list(RequestFilter::default().client("acme").status(RequestStatus::Done))
            .unwrap()
            .collect()
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn listing_is_restartable_and_lazy() {
        let (store, nos) = seeded();
        let listing = store.list(RequestFilter::default()).unwrap();
        assert_eq!(listing.iter().count(), 3);

        // Later writes show through; later creates do not.
        store
            .update_serial(&nos[1], 1, SerialPatch::default().serial_no("SN1"))
            .unwrap();
        store.create(NewRequest::new("Late", "M1", 1, date(2024, 11, 28))).unwrap();

        let again = listing.collect().unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(again[1].serials[0].serial_no, "SN1");
        assert_eq!(listing.snapshot_len(), 3);
    }

    #[test]
    fn sorted_orders() {
        let (store, _) = seeded();
        let listing = store.list(RequestFilter::default()).unwrap();

        let by_date = listing.sorted(RequestSort::RequestDate).unwrap();
        assert_eq!(clients(&by_date), vec!["Bolt Co", "ACME Optics", "Acme"]);

        let by_expected = listing.sorted(RequestSort::ExpectedDate).unwrap();
        assert_eq!(by_expected[0].client, "Bolt Co");

        let by_status = listing.sorted(RequestSort::Status).unwrap();
        assert_eq!(clients(&by_status), vec!["Acme", "ACME Optics", "Bolt Co"]);
    }

    #[test]
    fn page_reports_total() {
        let (store, _) = seeded();
        let listing = store.list(RequestFilter::default()).unwrap();
        let page = listing
            .page(RequestSort::Insertion, &ListParams { limit: 2, offset: 0 })
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
        assert!(page.has_more);
    }

    #[test]
    fn sort_parse() {
        assert_eq!("request-date".parse::<RequestSort>().unwrap(), RequestSort::RequestDate);
        assert_eq!("expected_date".parse::<RequestSort>().unwrap(), RequestSort::ExpectedDate);
        assert_eq!("Status".parse::<RequestSort>().unwrap(), RequestSort::Status);
        assert!("priority".parse::<RequestSort>().is_err());
    }
}
