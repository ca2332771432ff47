//! Table configuration

use std::path::Path;
use std::time::Duration;

use nested_table_backend::SortDirection;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Breakpoint;

/// Columns shown at each responsive breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSets {
    pub small: Vec<String>,
    pub medium: Vec<String>,
    pub large: Vec<String>,
}

impl Default for ColumnSets {
    fn default() -> Self {
        let cols = |names: &[&str]| names.iter().map(ToString::to_string).collect();
        Self {
            small: cols(&["id", "name", "status"]),
            medium: cols(&["id", "name", "description", "status", "updatedAt"]),
            large: cols(&[
                "id",
                "name",
                "description",
                "status",
                "createdAt",
                "updatedAt",
            ]),
        }
    }
}

impl ColumnSets {
    #[must_use]
    pub fn for_breakpoint(&self, breakpoint: Breakpoint) -> &[String] {
        match breakpoint {
            Breakpoint::Small => &self.small,
            Breakpoint::Medium => &self.medium,
            Breakpoint::Large => &self.large,
        }
    }
}

/// Table controller configuration
///
/// Every field has a default, so `{}` is a valid configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    /// Rows per page
    pub page_size: u32,
    /// Initial sort column
    pub sort_field: String,
    /// Initial sort direction
    pub sort_direction: SortDirection,
    /// Quiet window of the search gate
    pub search_debounce_ms: u64,
    /// Quiet window of the row-toggle gate
    pub toggle_debounce_ms: u64,
    /// Minimum settled search length that triggers a reload (0 always does)
    pub min_search_length: usize,
    /// Fields that stay disabled in edit mode
    pub read_only_fields: Vec<String>,
    /// Reload the page after a row vanished between views
    pub refresh_on_not_found: bool,
    /// Responsive column sets
    pub columns: ColumnSets,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            sort_field: "updatedAt".to_string(),
            sort_direction: SortDirection::Desc,
            search_debounce_ms: 500,
            toggle_debounce_ms: 500,
            min_search_length: 2,
            read_only_fields: vec!["id".to_string()],
            refresh_on_not_found: true,
            columns: ColumnSets::default(),
        }
    }
}

impl TableConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validated()
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Reject values the controller cannot work with.
    pub fn validated(self) -> CoreResult<Self> {
        if self.page_size == 0 {
            return Err(CoreError::Config("pageSize must be at least 1".to_string()));
        }
        if self.search_debounce_ms == 0 || self.toggle_debounce_ms == 0 {
            return Err(CoreError::Config(
                "debounce windows must be at least 1 ms".to_string(),
            ));
        }
        if self.sort_field.trim().is_empty() {
            return Err(CoreError::Config("sortField must not be empty".to_string()));
        }
        Ok(self)
    }

    #[must_use]
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    #[must_use]
    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = TableConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TableConfig::default());
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert_eq!(config.read_only_fields, ["id"]);
    }

    #[test]
    fn partial_document_overrides() {
        let config = TableConfig::from_json_str(
            r#"{ "pageSize": 25, "sortField": "id", "sortDirection": "asc" }"#,
        )
        .unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.sort_field, "id");
        assert_eq!(config.sort_direction, SortDirection::Asc);
        assert_eq!(config.min_search_length, 2);
    }

    #[test]
    fn zero_page_size_rejected() {
        let err = TableConfig::from_json_str(r#"{ "pageSize": 0 }"#).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(TableConfig::from_json_str("{ pageSize: }").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "toggleDebounceMs": 250 }}"#).unwrap();

        let config = TableConfig::load(file.path()).unwrap();
        assert_eq!(config.toggle_debounce(), Duration::from_millis(250));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TableConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn columns_follow_breakpoint() {
        let columns = ColumnSets::default();
        assert_eq!(columns.for_breakpoint(Breakpoint::Small).len(), 3);
        assert_eq!(columns.for_breakpoint(Breakpoint::Large).len(), 6);
    }
}
