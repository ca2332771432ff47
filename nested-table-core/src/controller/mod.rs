//! Table controller
//!
//! [`TableController`] wires the gates, the page loader and the expansion
//! state machine together behind one cloneable handle. All mutable state
//! lives behind a single `tokio::sync::Mutex`; the lock is never held across
//! a backend call, a confirmation prompt or a debounce timer.

mod builder;

pub use builder::TableControllerBuilder;

use std::sync::{Arc, OnceLock, Weak};

use futures::{Stream, StreamExt};
use nested_table_backend::paging::sanitize_filter;
use nested_table_backend::utils::truncate_for_log;
use nested_table_backend::{BackendError, CrudBackend, Row, SortDirection};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, Mutex};

use crate::config::TableConfig;
use crate::error::{CoreError, CoreResult};
use crate::gate::{search_triggers, DebounceGate, SingleFlight};
use crate::services::{Applied, CommitPlan, ExpansionController, PageLoader, TableContext};
use crate::subscriptions::SubscriptionRegistry;
use crate::types::{
    Breakpoint, ConfirmRequest, CreateOutcome, DeleteOutcome, ExpansionEvent, ExpansionState,
    LoadOutcome, PageChange, PageState, RowId, SaveOutcome, TableEvent, TableSnapshot,
    ToggleOutcome,
};
use crate::utils::sanitize_row;

/// Buffered domain events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

struct TableState<T> {
    page: PageState<T>,
    expansion: ExpansionController<T>,
    breakpoint: Breakpoint,
    columns: Vec<String>,
}

struct Gates {
    search: DebounceGate<String>,
    toggle: DebounceGate<RowId>,
    pages: mpsc::UnboundedSender<PageChange>,
}

struct Inner<T: Row> {
    ctx: Arc<TableContext<T>>,
    loader: PageLoader<T>,
    state: Mutex<TableState<T>>,
    flight: SingleFlight,
    subscriptions: SubscriptionRegistry,
    events: broadcast::Sender<TableEvent>,
    gates: OnceLock<Gates>,
}

/// Controller of one paginated table with a single expandable, editable row.
///
/// Backend failures never surface as `Err`: they are notified and mapped onto
/// the outcome enums. `Err` means misuse (wrong state, unknown row) or a
/// torn-down table.
pub struct TableController<T: Row> {
    inner: Arc<Inner<T>>,
}

impl<T: Row> Clone for TableController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Row> TableController<T> {
    #[must_use]
    pub fn builder(backend: Arc<dyn CrudBackend<T>>) -> TableControllerBuilder<T> {
        TableControllerBuilder::new(backend)
    }

    fn from_context(ctx: Arc<TableContext<T>>) -> Self {
        let config = &ctx.config;
        let breakpoint = Breakpoint::default();
        let state = TableState {
            page: PageState::new(
                config.page_size,
                config.sort_field.clone(),
                config.sort_direction,
            ),
            expansion: ExpansionController::new(config.read_only_fields.clone()),
            breakpoint,
            columns: config.columns.for_breakpoint(breakpoint).to_vec(),
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                loader: PageLoader::new(Arc::clone(&ctx)),
                ctx,
                state: Mutex::new(state),
                flight: SingleFlight::new(),
                subscriptions: SubscriptionRegistry::new(),
                events,
                gates: OnceLock::new(),
            }),
        }
    }

    fn upgrade(weak: &Weak<Inner<T>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // ===== Lifecycle =====

    /// Spawn the search gate, the toggle gate and the pagination listener,
    /// then load the first page.
    pub async fn start(&self) -> CoreResult<LoadOutcome> {
        self.ensure_live()?;
        if self.is_started() {
            return Err(CoreError::InvalidTransition(
                "table already started".to_string(),
            ));
        }
        let config = &self.inner.ctx.config;
        let subscriptions = &self.inner.subscriptions;
        let weak = Arc::downgrade(&self.inner);

        let (search, handle) = DebounceGate::spawn("search", config.search_debounce(), {
            let weak = weak.clone();
            move |text: String| {
                let table = Self::upgrade(&weak);
                async move {
                    if let Some(table) = table {
                        if let Err(e) = table.apply_search(&text).await {
                            log::debug!("Settled search dropped: {e}");
                        }
                    }
                }
            }
        });
        subscriptions.register("search-debounce", handle)?;

        let (toggle, handle) = DebounceGate::spawn_exclusive("toggle", config.toggle_debounce(), {
            let weak = weak.clone();
            move |id: RowId| {
                let table = Self::upgrade(&weak);
                async move {
                    if let Some(table) = table {
                        match table.toggle(&id).await {
                            Ok(outcome) => log::debug!("Debounced toggle of row '{id}': {outcome:?}"),
                            Err(e) => log::debug!("Debounced toggle of row '{id}' failed: {e}"),
                        }
                    }
                }
            }
        });
        subscriptions.register("toggle-debounce", handle)?;

        let (pages, mut changes) = mpsc::unbounded_channel::<PageChange>();
        subscriptions.spawn("pagination", async move {
            while let Some(change) = changes.recv().await {
                let Some(table) = Self::upgrade(&weak) else {
                    break;
                };
                if let Err(e) = table.go_to_page(change).await {
                    log::debug!("Page change to {} dropped: {e}", change.page);
                }
            }
        })?;

        if self.inner.gates.set(Gates { search, toggle, pages }).is_err() {
            return Err(CoreError::InvalidTransition(
                "table already started".to_string(),
            ));
        }
        log::info!("{} table started", self.class_name());
        self.load().await
    }

    pub fn is_started(&self) -> bool {
        self.inner.gates.get().is_some()
    }

    /// Release every subscription and cancel pending prompts and fetches.
    ///
    /// Idempotent. Every later operation fails with `CoreError::ShutDown`.
    pub fn teardown(&self) -> usize {
        let released = self.inner.subscriptions.release_all();
        log::info!(
            "{} table torn down ({released} subscriptions released)",
            self.class_name()
        );
        released
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.subscriptions.is_closed()
    }

    fn ensure_live(&self) -> CoreResult<()> {
        if self.is_torn_down() {
            Err(CoreError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn gates(&self) -> CoreResult<&Gates> {
        self.ensure_live()?;
        self.inner.gates.get().ok_or(CoreError::NotStarted)
    }

    // ===== Raw input (debounced) =====

    /// Feed one search keystroke state into the search gate.
    pub fn search(&self, raw: &str) -> CoreResult<()> {
        if self.gates()?.search.submit(raw.to_string()) {
            Ok(())
        } else {
            Err(CoreError::ShutDown)
        }
    }

    /// Feed a row-header click into the toggle gate.
    pub fn request_toggle(&self, id: &str) -> CoreResult<()> {
        if self.gates()?.toggle.submit(id.to_string()) {
            Ok(())
        } else {
            Err(CoreError::ShutDown)
        }
    }

    /// Feed a pager change into the pagination listener.
    pub fn request_page(&self, change: PageChange) -> CoreResult<()> {
        self.gates()?
            .pages
            .send(change)
            .map_err(|_| CoreError::ShutDown)
    }

    // ===== Loading =====

    /// Reload the current page with the current filter and sort.
    pub async fn reload(&self) -> CoreResult<LoadOutcome> {
        self.load().await
    }

    async fn load(&self) -> CoreResult<LoadOutcome> {
        self.ensure_live()?;
        let (seq, query) = {
            let mut st = self.inner.state.lock().await;
            st.page.loading = true;
            (self.inner.loader.issue(), st.page.query())
        };

        let load = self
            .inner
            .subscriptions
            .guard(self.inner.loader.fetch(seq, &query))
            .await?;

        let mut guard = self.inner.state.lock().await;
        if !self.inner.loader.is_latest(seq) {
            log::debug!(
                "Discarding stale page load #{seq} (latest is #{})",
                self.inner.loader.latest()
            );
            return Ok(LoadOutcome::Stale { seq });
        }

        let st = &mut *guard;
        st.page.loading = false;
        let edited = match st.expansion.state() {
            ExpansionState::Editing(id) => st.page.find(id).cloned(),
            _ => None,
        };
        let outcome = if let Some(e) = load.error {
            self.inner.ctx.report("load", &CoreError::Backend(e));
            st.page.clear(seq);
            LoadOutcome::Failed { seq }
        } else {
            st.page.apply(seq, load.result);
            LoadOutcome::Applied { seq }
        };
        if let Some(applied) = st.expansion.reconcile(&mut st.page, edited, &self.inner.ctx)? {
            self.publish(&applied);
        }
        self.emit(TableEvent::PageLoaded {
            seq,
            page: st.page.page,
            total: st.page.total,
        });
        Ok(outcome)
    }

    /// Apply a settled search input.
    ///
    /// Returns `None` if the input is too short to trigger a reload. A
    /// non-empty search jumps back to the first page; clearing it keeps the
    /// current page.
    pub async fn apply_search(&self, raw: &str) -> CoreResult<Option<LoadOutcome>> {
        self.ensure_live()?;
        let filter = sanitize_filter(raw);
        let len = filter.chars().count();
        if !search_triggers(len, self.inner.ctx.config.min_search_length) {
            log::debug!("Search '{}' is too short to reload", truncate_for_log(&filter));
            return Ok(None);
        }
        {
            let mut st = self.inner.state.lock().await;
            if len > 0 {
                st.page.page = 1;
            }
            st.page.filter = filter;
        }
        self.load().await.map(Some)
    }

    pub async fn set_sort(
        &self,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> CoreResult<LoadOutcome> {
        self.ensure_live()?;
        {
            let mut st = self.inner.state.lock().await;
            st.page.sort_field = field.into();
            st.page.sort_direction = direction;
        }
        self.load().await
    }

    /// Collapse the expansion (rolling back any edit) and load another page.
    pub async fn go_to_page(&self, change: PageChange) -> CoreResult<LoadOutcome> {
        self.ensure_live()?;
        {
            let mut guard = self.inner.state.lock().await;
            self.dispatch(&mut guard, ExpansionEvent::Collapse)?;
            guard.page.page = change.page.max(1);
            if let Some(size) = change.page_size {
                guard.page.page_size = size.max(1);
            }
        }
        self.load().await
    }

    // ===== Expansion =====

    /// Open, close or switch the expanded row.
    ///
    /// Dropped (not queued) while another transition is in flight. A row
    /// without an ID, or one that is no longer on the page, is reported to
    /// the user, collapses the expansion and reloads the page.
    pub async fn toggle(&self, id: &str) -> CoreResult<ToggleOutcome> {
        self.ensure_live()?;
        let Some(_flight) = self.inner.flight.try_acquire() else {
            log::debug!("Toggle of row '{id}' dropped: another transition is in flight");
            return Ok(ToggleOutcome::Dropped);
        };
        let ctx = &self.inner.ctx;

        let reload = {
            let mut guard = self.inner.state.lock().await;
            if id.is_empty() {
                ctx.report("open", &CoreError::MissingRowId);
                self.dispatch(&mut guard, ExpansionEvent::Collapse)?;
                true
            } else if !guard.page.contains(id) {
                ctx.report("open", &CoreError::RowNotOnPage(id.to_string()));
                self.dispatch(&mut guard, ExpansionEvent::Collapse)?;
                ctx.config.refresh_on_not_found
            } else {
                let state = self.dispatch(&mut guard, ExpansionEvent::Toggle(id.to_string()))?;
                return Ok(ToggleOutcome::Applied(state));
            }
        };

        if reload {
            self.load().await?;
        }
        Ok(ToggleOutcome::Applied(self.expansion().await))
    }

    /// Switch the open row to edit mode.
    pub async fn edit(&self) -> CoreResult<ExpansionState> {
        self.ensure_live()?;
        let _flight = self.inner.flight.try_acquire().ok_or(CoreError::Busy)?;
        let mut guard = self.inner.state.lock().await;
        self.dispatch(&mut guard, ExpansionEvent::Edit)
    }

    /// Write one form field of the edited row.
    pub async fn edit_field(&self, field: &str, value: Value) -> CoreResult<()> {
        self.ensure_live()?;
        let mut guard = self.inner.state.lock().await;
        let TableState {
            page, expansion, ..
        } = &mut *guard;
        let ExpansionState::Editing(id) = expansion.state().clone() else {
            return Err(CoreError::NotEditing);
        };
        let slot = page
            .find_mut(&id)
            .ok_or_else(|| CoreError::RowNotOnPage(id.clone()))?;
        expansion
            .session_mut()
            .write_field(&mut slot.row, field, value)?;
        *slot = self.inner.ctx.format(slot.row.clone());
        Ok(())
    }

    /// Commit the edited row.
    ///
    /// On backend failure the row is re-read and replaced by the
    /// authoritative copy, and stays editable. If it cannot be re-read the
    /// expansion collapses.
    pub async fn save(&self) -> CoreResult<SaveOutcome> {
        self.ensure_live()?;
        let _flight = self.inner.flight.try_acquire().ok_or(CoreError::Busy)?;
        let ctx = &self.inner.ctx;

        let (id, plan) = {
            let st = self.inner.state.lock().await;
            let ExpansionState::Editing(id) = st.expansion.state().clone() else {
                return Err(CoreError::NotEditing);
            };
            let row = st
                .page
                .find(&id)
                .ok_or_else(|| CoreError::RowNotOnPage(id.clone()))?;
            let plan = st
                .expansion
                .session()
                .prepare_commit(&row.row, ctx.hooks.as_ref())?;
            (id, plan)
        };

        let row = match plan {
            CommitPlan::Invalid(errors) => {
                log::debug!(
                    "Save of {} {id} blocked by validation ({})",
                    ctx.class_name(),
                    errors.fields().collect::<Vec<_>>().join(", ")
                );
                return Ok(SaveOutcome::Invalid(errors));
            }
            CommitPlan::Ready { row, changed } => {
                log::debug!(
                    "Saving {} {id}, changed: [{}]",
                    ctx.class_name(),
                    changed.join(", ")
                );
                row
            }
        };

        let err = match self.inner.subscriptions.guard(ctx.backend.update(&row)).await? {
            Ok(true) => {
                {
                    let mut guard = self.inner.state.lock().await;
                    if is_editing(guard.expansion.state(), &id) {
                        guard.page.replace_row(ctx.format(row));
                        self.dispatch(&mut guard, ExpansionEvent::SaveSucceeded)?;
                    } else {
                        log::debug!("Row {id} left edit mode while its save was in flight");
                    }
                }
                ctx.notify_success(&format!("{} saved", ctx.class_name()));
                return Ok(SaveOutcome::Saved);
            }
            Ok(false) => CoreError::Backend(BackendError::Update {
                id: id.clone(),
                detail: "update was rejected".to_string(),
            }),
            Err(e) => CoreError::Backend(e),
        };

        ctx.report("save", &err);
        self.reload_edited_row(&id).await?;
        Ok(SaveOutcome::Failed)
    }

    async fn reload_edited_row(&self, id: &str) -> CoreResult<()> {
        let ctx = &self.inner.ctx;
        match self.inner.subscriptions.guard(self.inner.loader.read(id)).await? {
            Ok(fresh) => {
                let mut guard = self.inner.state.lock().await;
                if is_editing(guard.expansion.state(), id) && guard.page.replace_row(fresh) {
                    self.dispatch(&mut guard, ExpansionEvent::SaveFailed)?;
                }
                Ok(())
            }
            Err(e) => {
                let not_found = matches!(e, BackendError::NotFound { .. });
                ctx.report("reload", &CoreError::Backend(e));
                {
                    let mut guard = self.inner.state.lock().await;
                    self.dispatch(&mut guard, ExpansionEvent::Collapse)?;
                }
                if not_found && ctx.config.refresh_on_not_found {
                    self.load().await?;
                }
                Ok(())
            }
        }
    }

    /// Abandon the edit and restore the pre-edit values.
    pub async fn cancel(&self) -> CoreResult<ExpansionState> {
        self.ensure_live()?;
        let _flight = self.inner.flight.try_acquire().ok_or(CoreError::Busy)?;
        let mut guard = self.inner.state.lock().await;
        self.dispatch(&mut guard, ExpansionEvent::Cancel)
    }

    // ===== Create / delete =====

    /// Ask for confirmation, delete the row and reload the page.
    pub async fn delete(&self, id: &str) -> CoreResult<DeleteOutcome> {
        self.ensure_live()?;
        if !self.inner.state.lock().await.page.contains(id) {
            return Err(CoreError::RowNotOnPage(id.to_string()));
        }
        let ctx = &self.inner.ctx;
        let class = ctx.class_name();

        let request = ConfirmRequest::new(
            format!("Delete {class}"),
            format!("Delete {class} {id}? This cannot be undone."),
        );
        let confirmed = self
            .inner
            .subscriptions
            .guard(ctx.confirmer.confirm(&request))
            .await?;
        if !confirmed {
            log::debug!("Deletion of {class} {id} declined");
            return Ok(DeleteOutcome::Declined);
        }

        let err = match self.inner.subscriptions.guard(ctx.backend.delete(id)).await? {
            Ok(true) => {
                {
                    let mut guard = self.inner.state.lock().await;
                    self.dispatch(&mut guard, ExpansionEvent::Deleted(id.to_string()))?;
                }
                ctx.notify_success(&format!("{class} deleted"));
                self.load().await?;
                return Ok(DeleteOutcome::Deleted);
            }
            Ok(false) => CoreError::Backend(BackendError::Delete {
                id: id.to_string(),
                detail: "delete was rejected".to_string(),
            }),
            Err(e) => CoreError::Backend(e),
        };
        ctx.report("delete", &err);
        Ok(DeleteOutcome::Failed)
    }

    /// Validate and create a row, then reload the page.
    pub async fn create(&self, mut row: T) -> CoreResult<CreateOutcome<T>> {
        self.ensure_live()?;
        let ctx = &self.inner.ctx;
        ctx.hooks.formalize(&mut row);
        let errors = ctx.hooks.validate(&row);
        if !errors.is_valid() {
            return Ok(CreateOutcome::Invalid(errors));
        }

        match self.inner.subscriptions.guard(ctx.backend.create(&row)).await? {
            Ok(created) => {
                log::info!("Created {} {}", ctx.class_name(), created.id());
                ctx.notify_success(&format!("{} created", ctx.class_name()));
                self.load().await?;
                Ok(CreateOutcome::Created(created))
            }
            Err(e) => {
                ctx.report("create", &CoreError::Backend(e));
                Ok(CreateOutcome::Failed)
            }
        }
    }

    /// Merge a row produced outside the table (e.g. a dialog) into the page,
    /// stripping markup from its strings.
    ///
    /// Returns `false` if the row is not on the current page.
    pub async fn update_row(&self, row: T) -> CoreResult<bool> {
        self.ensure_live()?;
        let row = sanitize_row(&row)?;
        let id = row.id().to_string();

        let mut guard = self.inner.state.lock().await;
        let TableState {
            page, expansion, ..
        } = &mut *guard;
        if is_editing(expansion.state(), &id) {
            return Err(CoreError::InvalidTransition(format!(
                "row {id} is being edited"
            )));
        }
        if !page.replace_row(self.inner.ctx.format(row)) {
            return Ok(false);
        }
        if expansion.state().is_expanded(&id) {
            if let Some(current) = page.find(&id) {
                expansion.session_mut().snapshot(&current.row);
            }
        }
        self.emit(TableEvent::RowRefreshed { row_id: id });
        Ok(true)
    }

    // ===== Observers =====

    /// Domain events of this table.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.inner.events.subscribe()
    }

    /// Run `handler` for every item of an external stream until teardown.
    pub fn observe<S, F>(&self, name: &str, stream: S, mut handler: F) -> CoreResult<()>
    where
        S: Stream + Send + 'static,
        F: FnMut(S::Item) + Send + 'static,
    {
        self.ensure_live()?;
        self.inner.subscriptions.spawn(
            name,
            stream.for_each(move |item| {
                handler(item);
                futures::future::ready(())
            }),
        )
    }

    /// Drive the visible columns from a breakpoint observer.
    pub fn observe_breakpoints<S>(&self, stream: S) -> CoreResult<()>
    where
        S: Stream<Item = Breakpoint> + Send + 'static,
    {
        self.ensure_live()?;
        let weak = Arc::downgrade(&self.inner);
        self.inner.subscriptions.spawn(
            "breakpoints",
            stream.for_each(move |breakpoint| {
                let table = Self::upgrade(&weak);
                async move {
                    if let Some(table) = table {
                        if let Err(e) = table.set_breakpoint(breakpoint).await {
                            log::debug!("Breakpoint change to {breakpoint:?} dropped: {e}");
                        }
                    }
                }
            }),
        )
    }

    /// Switch the column set. Returns `false` if the breakpoint did not change.
    pub async fn set_breakpoint(&self, breakpoint: Breakpoint) -> CoreResult<bool> {
        self.ensure_live()?;
        let mut st = self.inner.state.lock().await;
        if st.breakpoint == breakpoint {
            return Ok(false);
        }
        let columns = self
            .inner
            .ctx
            .config
            .columns
            .for_breakpoint(breakpoint)
            .to_vec();
        st.breakpoint = breakpoint;
        st.columns.clone_from(&columns);
        self.emit(TableEvent::ColumnsChanged {
            breakpoint,
            columns,
        });
        Ok(true)
    }

    // ===== Accessors =====

    pub async fn snapshot(&self) -> TableSnapshot<T> {
        let st = self.inner.state.lock().await;
        TableSnapshot {
            rows: st.page.rows.clone(),
            total: st.page.total,
            page: st.page.page,
            total_pages: st.page.total_pages,
            page_size: st.page.page_size,
            filter: st.page.filter.clone(),
            sort_field: st.page.sort_field.clone(),
            sort_direction: st.page.sort_direction,
            expansion: st.expansion.state().clone(),
            columns: st.columns.clone(),
            loading: st.page.loading,
        }
    }

    pub async fn expansion(&self) -> ExpansionState {
        self.inner.state.lock().await.expansion.state().clone()
    }

    pub async fn visible_columns(&self) -> Vec<String> {
        self.inner.state.lock().await.columns.clone()
    }

    pub fn column_label(&self, name: &str) -> String {
        self.inner.ctx.hooks.column_label(name)
    }

    pub fn class_name(&self) -> &str {
        self.inner.ctx.class_name()
    }

    pub fn config(&self) -> &TableConfig {
        &self.inner.ctx.config
    }

    // ===== Internals =====

    fn dispatch(&self, st: &mut TableState<T>, event: ExpansionEvent) -> CoreResult<ExpansionState> {
        let TableState {
            page, expansion, ..
        } = st;
        let applied = expansion.dispatch(event, page, &self.inner.ctx)?;
        self.publish(&applied);
        Ok(applied.transition.to)
    }

    fn publish(&self, applied: &Applied<T>) {
        if applied.changed_state() {
            self.emit(TableEvent::ExpansionChanged {
                from: applied.transition.from.clone(),
                to: applied.transition.to.clone(),
            });
        }
        for id in &applied.refreshed {
            self.emit(TableEvent::RowRefreshed { row_id: id.clone() });
        }
        for row in &applied.removed {
            self.emit(TableEvent::RowRemoved {
                row_id: row.id().to_string(),
            });
        }
    }

    fn emit(&self, event: TableEvent) {
        // no receivers is fine
        let _ = self.inner.events.send(event);
    }
}

fn is_editing(state: &ExpansionState, id: &str) -> bool {
    matches!(state, ExpansionState::Editing(current) if current == id)
}
