//! Markup stripping for rows coming from outside the table.

use std::sync::LazyLock;

use nested_table_backend::{from_value, to_value, Row};
use regex::Regex;
use serde_json::Value;

use crate::error::CoreResult;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"<[^>]*>").unwrap()
});

pub fn strip_markup(s: &str) -> String {
    MARKUP.replace_all(s, "").into_owned()
}

/// Strip markup from every string in a row, nested values included.
pub fn sanitize_row<T: Row>(row: &T) -> CoreResult<T> {
    let mut value = to_value(row)?;
    strip_value(&mut value);
    Ok(from_value(value)?)
}

fn strip_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if MARKUP.is_match(s) {
                *s = strip_markup(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_value),
        Value::Object(map) => map.values_mut().for_each(strip_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::product;

    #[test]
    fn strips_tags() {
        assert_eq!(strip_markup("<b>Lamp</b> <script>x</script>"), "Lamp x");
        assert_eq!(strip_markup("2 < 3"), "2 < 3");
    }

    #[test]
    fn sanitizes_every_string_field() {
        let row = product("1", "<i>Lamp</i>", "<span>Active</span>");
        let clean = sanitize_row(&row).unwrap();
        assert_eq!(clean.name, "Lamp");
        assert_eq!(clean.status, "Active");
        assert_eq!(clean.id, "1");
    }
}
