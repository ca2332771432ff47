use async_trait::async_trait;

use crate::error::Result;
use crate::row::Row;
use crate::types::{PageQuery, PageResult};

/// Backend Trait
///
/// The only source of truth for persisted rows. The table core calls it for
/// every page load, authoritative re-read, create, update and delete.
#[async_trait]
pub trait CrudBackend<T: Row>: Send + Sync {
    /// Display name of the entity (used in user-facing messages).
    fn class_name(&self) -> &str;

    /// Fetch one page.
    ///
    /// Implementations clamp `page` into `[1, ceil(total / page_size)]` after
    /// filtering and report the served page in the result.
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult<T>>;

    /// Read one row by ID.
    ///
    /// Fails with [`BackendError::NotFound`](crate::BackendError::NotFound)
    /// if the row no longer exists.
    async fn read(&self, id: &str) -> Result<T>;

    /// Create a row; the backend assigns the ID.
    async fn create(&self, row: &T) -> Result<T>;

    /// Update a row. `Ok(false)` means the backend refused the write.
    async fn update(&self, row: &T) -> Result<bool>;

    /// Delete a row by ID.
    async fn delete(&self, id: &str) -> Result<bool>;
}
