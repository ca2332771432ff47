//! Property-path lookup for column cells.

use serde_json::Value;

/// Separator between the values of a multi-path column.
pub const PATH_JOINER: &str = " \u{2014} ";

/// Resolve a column path against a row projection.
///
/// `path` is one or more space-separated dotted paths (`"supplier.name
/// supplier.country"`); each resolved value is rendered as text and the
/// results are joined with [`PATH_JOINER`]. Missing values render empty.
pub fn property_by_path(row: &Value, path: &str) -> String {
    path.split_whitespace()
        .map(|sub_path| {
            sub_path
                .split('.')
                .try_fold(row, |acc, part| lookup(acc, part))
                .map(render)
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(PATH_JOINER)
}

fn lookup<'a>(value: &'a Value, part: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
