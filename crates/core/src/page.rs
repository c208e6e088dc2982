//! Pagination envelope for report queries.

use serde::{Deserialize, Serialize};

/// One page of a paginated result set.
///
/// `total` counts every row matching the filter, not just the rows on this
/// page; it comes from a separate COUNT query over the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let page = Page {
            content: vec![1, 2, 3],
            page: 2,
            page_size: 20,
            total: 45,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": [1, 2, 3], "page": 2, "pageSize": 20, "total": 45})
        );
    }
}
