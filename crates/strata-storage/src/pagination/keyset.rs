//! Keyset cursor pagination over (sort value, id) pairs. No OFFSET scans.
//! Constant-time page retrieval regardless of position.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// A cursor for keyset pagination. Composite: (sort_value, id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    pub last_sort_value: String,
    pub last_id: String,
}

impl PaginationCursor {
    pub fn new(last_sort_value: impl Into<String>, last_id: impl Into<String>) -> Self {
        Self {
            last_sort_value: last_sort_value.into(),
            last_id: last_id.into(),
        }
    }

    /// Encode cursor as URL-safe base64 JSON.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode cursor from base64 JSON. Returns None for anything malformed.
    pub fn decode(encoded: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// A paginated result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total: u64,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl<T> PaginatedResult<T> {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
            next_cursor: None,
        }
    }

    /// Build a page from `limit + 1` fetched rows. The extra row only signals
    /// that another page exists and is dropped.
    pub fn from_overfetch<F>(mut rows: Vec<T>, limit: usize, total: u64, cursor_of: F) -> Self
    where
        F: Fn(&T) -> PaginationCursor,
    {
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|last| cursor_of(last).encode())
        } else {
            None
        };
        Self {
            items: rows,
            total,
            has_more,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_cursor_decodes_to_none() {
        assert!(PaginationCursor::decode("%%%").is_none());
        assert!(PaginationCursor::decode("").is_none());
    }

    #[test]
    fn encoded_cursor_is_url_safe() {
        let cursor = PaginationCursor::new("src/a/b??>>", "src/a/b??>>");
        let encoded = cursor.encode();
        assert!(!encoded.contains('+') && !encoded.contains('/') && !encoded.contains('='));
        assert_eq!(PaginationCursor::decode(&encoded), Some(cursor));
    }

    #[test]
    fn overfetch_sets_cursor_only_when_more_rows_exist() {
        let page = PaginatedResult::from_overfetch(vec![1, 2, 3], 2, 3, |n| {
            PaginationCursor::new(n.to_string(), n.to_string())
        });
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);
        let cursor = PaginationCursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(cursor.last_id, "2");

        let last = PaginatedResult::from_overfetch(vec![3], 2, 3, |n| {
            PaginationCursor::new(n.to_string(), n.to_string())
        });
        assert!(!last.has_more);
        assert!(last.next_cursor.is_none());
    }
}
