use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{BackendError, Result};
use crate::paging;
use crate::row::Row;
use crate::traits::CrudBackend;
use crate::types::{PageQuery, PageResult};
use crate::utils::truncate_for_log;

type WriteHook<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// In-memory backend
///
/// Holds rows in a `Vec` behind an async lock. Every call can be delayed by a
/// fixed latency to mimic a remote service, and every write can pass through
/// a hook (e.g. to stamp `updatedAt`).
pub struct InMemoryBackend<T: Row> {
    class_name: String,
    rows: RwLock<Vec<T>>,
    latency: Duration,
    write_hook: Option<WriteHook<T>>,
}

impl<T: Row> InMemoryBackend<T> {
    /// Create a backend seeded with `rows`.
    #[must_use]
    pub fn new(class_name: impl Into<String>, rows: Vec<T>) -> Self {
        Self {
            class_name: class_name.into(),
            rows: RwLock::new(rows),
            latency: Duration::ZERO,
            write_hook: None,
        }
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Run `hook` on every row written by `create` or `update`.
    #[must_use]
    pub fn with_write_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.write_hook = Some(Arc::new(hook));
        self
    }

    /// Copy of every stored row.
    pub async fn rows(&self) -> Vec<T> {
        self.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn apply_write_hook(&self, row: &mut T) {
        if let Some(hook) = &self.write_hook {
            hook(row);
        }
    }

    /// Highest numeric ID plus one.
    fn next_id(rows: &[T]) -> String {
        let max = rows
            .iter()
            .filter_map(|r| r.id().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}

#[async_trait]
impl<T: Row> CrudBackend<T> for InMemoryBackend<T> {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult<T>> {
        log::debug!(
            "Fetching {} page {} (size {}) filter \"{}\" sorted by {} {}",
            self.class_name,
            query.page,
            query.page_size,
            truncate_for_log(&query.filter),
            query.sort_field,
            query.sort_direction
        );
        self.simulate_latency().await;

        let rows = self.rows.read().await;
        paging::paginate(&rows, query).map_err(|e| BackendError::Fetch(e.to_string()))
    }

    async fn read(&self, id: &str) -> Result<T> {
        self.simulate_latency().await;
        self.rows
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound { id: id.to_string() })
    }

    async fn create(&self, row: &T) -> Result<T> {
        self.simulate_latency().await;
        let mut rows = self.rows.write().await;

        let mut created = row.clone();
        created.set_id(Self::next_id(&rows));
        self.apply_write_hook(&mut created);
        rows.push(created.clone());

        log::debug!("Created {} {}", self.class_name, created.id());
        Ok(created)
    }

    async fn update(&self, row: &T) -> Result<bool> {
        self.simulate_latency().await;
        let mut rows = self.rows.write().await;

        let Some(slot) = rows.iter_mut().find(|r| r.id() == row.id()) else {
            log::warn!("Update of unknown {} {}", self.class_name, row.id());
            return Ok(false);
        };
        let mut updated = row.clone();
        self.apply_write_hook(&mut updated);
        *slot = updated;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.simulate_latency().await;
        let mut rows = self.rows.write().await;

        let Some(index) = rows.iter().position(|r| r.id() == id) else {
            return Err(BackendError::Delete {
                id: id.to_string(),
                detail: format!("{} with ID {id} not found", self.class_name),
            });
        };
        rows.remove(index);
        Ok(true)
    }
}
