//! # nested-table-backend
//!
//! The backend contract consumed by a nested editable table, plus the paging
//! engine every list backend needs.
//!
//! ## Contents
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`CrudBackend`] | `fetch_page` / `read` / `create` / `update` / `delete` |
//! | [`Row`] | Anything with a string `id` that serializes to a JSON object |
//! | [`PageQuery`], [`PageResult`] | Request and response envelopes for one page |
//! | [`paging`] | Filter sanitizing, field comparison, page clamping |
//! | [`InMemoryBackend`] | Reference backend holding rows in memory |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nested_table_backend::{CrudBackend, InMemoryBackend, PageQuery, Row, SortDirection};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Item {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Row for Item {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!
//!     fn set_id(&mut self, id: String) {
//!         self.id = id;
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryBackend::new("Item", vec![
//!         Item { id: "2".into(), name: "beta".into() },
//!         Item { id: "1".into(), name: "alpha".into() },
//!     ]);
//!
//!     let query = PageQuery::new("", 1, 10, "id", SortDirection::Asc);
//!     let page = backend.fetch_page(&query).await?;
//!     assert_eq!(page.data[0].id, "1");
//!     Ok(())
//! }
//! ```

mod error;
mod memory;
pub mod paging;
mod row;
mod traits;
mod types;
pub mod utils;

pub use error::{BackendError, Result};
pub use memory::InMemoryBackend;
pub use row::{Row, field, from_value, to_value};
pub use traits::CrudBackend;
pub use types::{PageQuery, PageResult, SortDirection};
