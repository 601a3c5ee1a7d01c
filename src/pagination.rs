//! Search and pagination for list endpoints.
//!
//! Lists are filtered by the access policy in memory, so search and
//! pagination run over the filtered rows and totals count visible rows only.

use serde::{Deserialize, Serialize};

/// Query parameters for list endpoints: `?q=&limit=&offset=`.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    /// Case-insensitive substring search
    #[serde(default)]
    pub q: Option<String>,
    /// Maximum number of items to return (default: 50, max: 100)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListQuery {
    /// Get the limit, clamped to valid range
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    /// Get the offset, minimum 0
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Lowercased search term, or None when absent or blank.
    pub fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Apply search then pagination to already policy-filtered rows.
    pub fn apply<T>(&self, rows: Vec<T>, matches: impl Fn(&T, &str) -> bool) -> Paginated<T> {
        let rows: Vec<T> = match self.needle() {
            Some(needle) => rows.into_iter().filter(|row| matches(row, &needle)).collect(),
            None => rows,
        };
        Paginated::from_rows(rows, self.limit(), self.offset())
    }
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// The items in this page
    pub items: Vec<T>,
    /// Total number of matching items (across all pages)
    pub total: i64,
    /// Maximum items per page (as requested)
    pub limit: i64,
    /// Items skipped (as requested)
    pub offset: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// Slice one page out of the full row set.
    pub fn from_rows(rows: Vec<T>, limit: i64, offset: i64) -> Self {
        let total = rows.len() as i64;
        let items = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Self::new(items, total, limit, offset)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
