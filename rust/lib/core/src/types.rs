use serde::{Deserialize, Serialize};

/// Parameters for paginated list operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListParams {
    /// Maximum number of results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset for pagination.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    /// Number of matching records before pagination.
    pub total: usize,
    pub has_more: bool,
}

impl<T: Serialize> ListResult<T> {
    /// Slice a fully materialized result set according to `params`.
    pub fn paginate(all: Vec<T>, params: &ListParams) -> Self {
        let total = all.len();
        let offset = params.offset.min(total);
        let end = offset.saturating_add(params.limit).min(total);
        let items: Vec<T> = all.into_iter().skip(offset).take(params.limit).collect();
        Self {
            items,
            total,
            has_more: end < total,
        }
    }
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_unique_hex() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
        assert_ne!(id, new_id());
    }

    #[test]
    fn paginate_slices_and_reports_total() {
        let all: Vec<u32> = (0..5).collect();

        let page = ListResult::paginate(all.clone(), &ListParams { limit: 2, offset: 0 });
        assert_eq!(page.items, vec![0, 1]);
        assert_eq!(page.total, 5);
        assert!(page.has_more);

        let page = ListResult::paginate(all.clone(), &ListParams { limit: 2, offset: 4 });
        assert_eq!(page.items, vec![4]);
        assert!(!page.has_more);

        let page = ListResult::paginate(all, &ListParams { limit: 10, offset: 100 });
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert!(!page.has_more);
    }

    #[test]
    fn paginate_huge_limit_does_not_overflow() {
        let all: Vec<u32> = (0..5).collect();
        let page = ListResult::paginate(all, &ListParams { limit: usize::MAX, offset: 1 });
        assert_eq!(page.items, vec![1, 2, 3, 4]);
        assert_eq!(page.total, 5);
        assert!(!page.has_more);
    }

    #[test]
    fn list_params_defaults_from_json() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(params.limit, 50);
    }
}
