//! Select-option lists and lenient number conversion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a select/autocomplete list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    pub key: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            key: value.clone(),
            label: value,
        }
    }
}

pub fn options_from_strings<I, S>(items: I) -> Vec<SelectOption>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(SelectOption::new).collect()
}

/// Options from enum variants, keyed by their serialized (string) form.
///
/// Variants that do not serialize to a string are skipped.
pub fn options_from_variants<E: Serialize>(variants: &[E]) -> Vec<SelectOption> {
    variants
        .iter()
        .filter_map(|v| match serde_json::to_value(v) {
            Ok(Value::String(s)) => Some(SelectOption::new(s)),
            _ => None,
        })
        .collect()
}

/// Numeric value of a form field, or `default` if it is empty or not a number.
pub fn to_number_or_default(value: &Value, default: f64) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(default),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                // an empty numeric input means zero
                0.0
            } else {
                s.parse().unwrap_or(default)
            }
        }
        _ => default,
    }
}
