use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============ Sorting ============

/// Direction of the single sort column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortDirection {
    /// Apply this direction to an ascending comparison result.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    /// Wire representation (`"asc"` / `"desc"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

// ============ Query ============

/// Parameters for fetching one page.
///
/// Pages are 1-indexed.
///
/// # Default
///
/// `filter = ""`, `page = 1`, `page_size = 10`, sorted by `updatedAt` descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Free-text filter matched against every field.
    pub filter: String,
    /// Page number (1-indexed).
    pub page: u32,
    /// Number of rows per page.
    pub page_size: u32,
    /// Field to sort by.
    pub sort_field: String,
    /// Sort direction.
    pub sort_direction: SortDirection,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            filter: String::new(),
            page: 1,
            page_size: 10,
            sort_field: "updatedAt".to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

impl PageQuery {
    pub fn new(
        filter: impl Into<String>,
        page: u32,
        page_size: u32,
        sort_field: impl Into<String>,
        sort_direction: SortDirection,
    ) -> Self {
        Self {
            filter: filter.into(),
            page,
            page_size,
            sort_field: sort_field.into(),
            sort_direction,
        }
    }

    /// Clamp pagination values to valid ranges and sanitize the filter.
    ///
    /// - `page` is clamped to `>= 1`
    /// - `page_size` is clamped to `>= 1`
    /// - `filter` goes through [`sanitize_filter`](crate::paging::sanitize_filter)
    #[must_use]
    pub fn validated(&self) -> Self {
        Self {
            filter: crate::paging::sanitize_filter(&self.filter),
            page: self.page.max(1),
            page_size: self.page_size.max(1),
            sort_field: self.sort_field.clone(),
            sort_direction: self.sort_direction,
        }
    }
}

// ============ Result ============

/// One page of rows plus pagination metadata.
///
/// Invariants: `count == data.len()`, `total >= count`,
/// `1 <= page <= max(1, total_pages)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// Rows of the current page.
    pub data: Vec<T>,
    /// Number of rows matching the filter across all pages.
    pub total: u64,
    /// Number of rows in `data`.
    pub count: u64,
    /// Page actually served (after clamping).
    pub page: u32,
    /// `ceil(total / limit)`.
    pub total_pages: u32,
    /// Page size used for this request.
    pub limit: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl<T> PageResult<T> {
    /// Build a result, deriving `count`, `total_pages`, the clamped page and the
    /// navigation flags.
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32, query: &PageQuery) -> Self {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        let page = page.min(total_pages).max(1);
        Self {
            count: data.len() as u64,
            data,
            total,
            page,
            total_pages,
            limit,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
            sort_field: query.sort_field.clone(),
            sort_direction: query.sort_direction,
        }
    }

    /// The result served when a fetch fails: no rows, `total = 0`.
    pub fn empty(query: &PageQuery) -> Self {
        Self::new(Vec::new(), 0, 1, query.page_size, query)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_str() {
        assert_eq!("ASC".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert_eq!(" desc ".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("up".parse::<SortDirection>().is_err());
        assert_eq!(SortDirection::Asc.to_string(), "asc");
    }

    #[test]
    fn direction_reverses_for_desc() {
        assert_eq!(SortDirection::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortDirection::Asc.apply(Ordering::Less), Ordering::Less);
    }

    #[test]
    fn validated_clamps_zero_values() {
        let q = PageQuery::new("Ab!c ", 0, 0, "id", SortDirection::Asc).validated();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 1);
        assert_eq!(q.filter, "abc");
    }

    #[test]
    fn result_computes_total_pages_and_clamps() {
        let q = PageQuery::new("", 5, 10, "id", SortDirection::Asc);
        let r: PageResult<u8> = PageResult::new(vec![1, 2, 3, 4, 5], 25, 5, 10, &q);
        assert_eq!(r.total_pages, 3);
        assert_eq!(r.page, 3);
        assert!(!r.has_next_page);
        assert!(r.has_previous_page);
        assert_eq!(r.count, 5);
    }

    #[test]
    fn empty_result_keeps_page_in_range() {
        let q = PageQuery::default();
        let r: PageResult<u8> = PageResult::empty(&q);
        assert_eq!(r.page, 1);
        assert_eq!(r.total, 0);
        assert_eq!(r.count, 0);
        assert_eq!(r.total_pages, 0);
        assert!(!r.has_next_page);
        assert!(!r.has_previous_page);
    }

    #[test]
    fn serializes_camel_case() {
        let q = PageQuery::default();
        let r: PageResult<u8> = PageResult::empty(&q);
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("totalPages").is_some());
        assert!(json.get("hasNextPage").is_some());
        assert_eq!(json["sortDirection"], "desc");
    }
}
