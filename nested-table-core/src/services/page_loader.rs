//! Page fetching with request sequencing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nested_table_backend::{BackendError, PageQuery, PageResult, Row};

use super::TableContext;
use crate::types::TableRow;

/// Result of one fetch, tagged with the sequence number it was issued under.
#[derive(Debug)]
pub struct PageLoad<T> {
    pub seq: u64,
    pub result: PageResult<TableRow<T>>,
    /// Set when the backend failed; `result` is then empty.
    pub error: Option<BackendError>,
}

/// Fetches pages and hands out monotonically increasing load sequence numbers.
///
/// The loader never fails: backend errors are turned into an empty page and
/// handed back in [`PageLoad::error`]. Deciding whether a result is still the
/// latest, and reporting its error, is up to the caller
/// ([`PageLoader::is_latest`]).
pub struct PageLoader<T: Row> {
    ctx: Arc<TableContext<T>>,
    seq: AtomicU64,
}

impl<T: Row> PageLoader<T> {
    #[must_use]
    pub fn new(ctx: Arc<TableContext<T>>) -> Self {
        Self {
            ctx,
            seq: AtomicU64::new(0),
        }
    }

    /// Issue the next sequence number.
    pub fn issue(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest() == seq
    }

    /// Fetch one page and run the display hook over every row.
    pub async fn fetch(&self, seq: u64, query: &PageQuery) -> PageLoad<T> {
        let query = query.validated();
        log::debug!(
            "Load #{seq}: {} page {} (size {}, filter '{}', sort {} {})",
            self.ctx.class_name(),
            query.page,
            query.page_size,
            query.filter,
            query.sort_field,
            query.sort_direction
        );

        match self.ctx.backend.fetch_page(&query).await {
            Ok(result) => {
                // Some backends under-report `total`; it can never be below the rows served.
                let total = result.total.max(result.data.len() as u64);
                let page = result.page;
                let data = result
                    .data
                    .into_iter()
                    .map(|row| self.ctx.format(row))
                    .collect();
                PageLoad {
                    seq,
                    result: PageResult::new(data, total, page, query.page_size, &query),
                    error: None,
                }
            }
            Err(e) => {
                log::debug!("Load #{seq} failed: {e}");
                PageLoad {
                    seq,
                    result: PageResult::empty(&query),
                    error: Some(e),
                }
            }
        }
    }

    /// Authoritative re-read of a single row.
    pub async fn read(&self, id: &str) -> Result<TableRow<T>, BackendError> {
        let row = self.ctx.backend.read(id).await?;
        Ok(self.ctx.format(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{catalog, test_context, FlakyBackend};
    use nested_table_backend::SortDirection;

    #[tokio::test]
    async fn sequence_is_monotonic() {
        let (ctx, _, _) = test_context(FlakyBackend::new(catalog(3)));
        let loader = PageLoader::new(ctx);
        let first = loader.issue();
        let second = loader.issue();
        assert!(second > first);
        assert!(!loader.is_latest(first));
        assert!(loader.is_latest(second));
    }

    #[tokio::test]
    async fn clamps_and_formats() {
        let (ctx, _, _) = test_context(FlakyBackend::new(catalog(25)));
        let loader = PageLoader::new(ctx);
        let query = PageQuery::new("", 5, 10, "id", SortDirection::Asc);
        let load = loader.fetch(loader.issue(), &query).await;

        assert!(load.error.is_none());
        assert_eq!(load.result.total_pages, 3);
        assert_eq!(load.result.page, 3);
        assert_eq!(load.result.count, 5);
        assert_eq!(load.result.data[0].display["priceLabel"], "$21.00");
    }

    #[tokio::test]
    async fn failure_yields_empty_page_without_notifying() {
        let backend = FlakyBackend::new(catalog(3));
        backend.fail_fetch(true);
        let (ctx, notifier, _) = test_context(backend);
        let loader = PageLoader::new(ctx);
        let load = loader.fetch(loader.issue(), &PageQuery::default()).await;

        assert!(matches!(load.error, Some(BackendError::Fetch(_))));
        assert_eq!(load.result.total, 0);
        assert_eq!(load.result.count, 0);
        assert!(notifier.errors().is_empty());
    }
}
