//! Paging engine shared by list backends.
//!
//! Filtering, single-column sorting and page clamping over the JSON
//! projection of rows (see [`Row`]).

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::row::{self, Row};
use crate::types::{PageQuery, PageResult, SortDirection};

/// Anything that is not a word character, whitespace or hyphen.
static FILTER_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[^A-Za-z0-9_\s-]").unwrap()
});

/// Normalize free-text filter input: strip everything except word characters,
/// whitespace and hyphens, lowercase, trim.
pub fn sanitize_filter(raw: &str) -> String {
    FILTER_STRIP.replace_all(raw, "").to_lowercase().trim().to_string()
}

/// Whether any non-empty field of the row contains `filter`.
///
/// `filter` must already be sanitized. An empty filter matches every row.
pub fn matches_filter(value: &Value, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let Some(fields) = value.as_object() else {
        return false;
    };
    fields
        .values()
        .filter_map(searchable_text)
        .any(|text| text.to_lowercase().contains(filter))
}

/// Text a field contributes to filtering; empty, zero, `false` and `null`
/// fields contribute nothing.
fn searchable_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Fields holding textual numeric keys (`id`, `productId`, `owner_id`).
pub fn is_id_like(field: &str) -> bool {
    field == "id" || field.ends_with("Id") || field.ends_with("_id")
}

/// Compare two row projections on `field` in the given direction.
///
/// Id-like fields compare numerically; if either side fails to parse the
/// comparison is `Equal` so the stable sort keeps the original order.
pub fn compare_rows(a: &Value, b: &Value, field: &str, direction: SortDirection) -> Ordering {
    let left = row::field(a, field);
    let right = row::field(b, field);

    let ordering = if is_id_like(field) {
        match (left.and_then(leading_int), right.and_then(leading_int)) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => Ordering::Equal,
        }
    } else {
        compare_values(left, right)
    };
    direction.apply(ordering)
}

/// Integer prefix of a key: `"42"` and `"42abc"` both give 42.
fn leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Bool(l)), Some(Value::Bool(r))) => l.cmp(r),
        (Some(Value::Number(l)), Some(Value::Number(r))) => {
            let l = l.as_f64().unwrap_or(0.0);
            let r = r.as_f64().unwrap_or(0.0);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(l)), Some(Value::String(r))) => l.cmp(r),
        (Some(l @ (Value::Array(_) | Value::Object(_))), Some(r))
            if type_rank(Some(l)) == type_rank(Some(r)) =>
        {
            l.to_string().cmp(&r.to_string())
        }
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

/// Filter, sort and slice `rows` into one page.
///
/// The requested page is clamped to `[1, ceil(total / page_size)]` after
/// filtering.
pub fn paginate<T: Row>(rows: &[T], query: &PageQuery) -> Result<PageResult<T>> {
    let query = query.validated();

    let mut matching = Vec::with_capacity(rows.len());
    for item in rows {
        let value = row::to_value(item)?;
        if matches_filter(&value, &query.filter) {
            matching.push((value, item));
        }
    }

    matching.sort_by(|(a, _), (b, _)| {
        compare_rows(a, b, &query.sort_field, query.sort_direction)
    });

    let total = matching.len() as u64;
    let page_size = query.page_size as usize;
    let total_pages = matching.len().div_ceil(page_size);
    let page = (query.page as usize).min(total_pages).max(1);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(matching.len());

    let data: Vec<T> = matching
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .map(|(_, item)| (*item).clone())
        .collect();

    #[allow(clippy::cast_possible_truncation)]
    Ok(PageResult::new(
        data,
        total,
        page as u32,
        query.page_size,
        &query,
    ))
}
