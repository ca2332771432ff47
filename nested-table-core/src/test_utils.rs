//! Test helper module
//!
//! Mock collaborators, a `Product` fixture row and factories for contexts and
//! controllers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nested_table_backend::{
    BackendError, CrudBackend, InMemoryBackend, PageQuery, PageResult, Result, Row,
};
use serde::{Deserialize, Serialize};

use crate::config::TableConfig;
use crate::controller::TableController;
use crate::services::TableContext;
use crate::traits::{Confirmer, Notifier, TableHooks};
use crate::types::{ConfirmRequest, DisplayFields, NotificationKind, ValidationErrors};

// ===== Product fixture =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub status: String,
    pub price_cents: u32,
    pub updated_at: String,
}

impl Row for Product {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

pub fn product(id: &str, name: &str, status: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        price_cents: 1000,
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// Products `1..=n`; higher IDs are more recently updated and cost more.
pub fn catalog(n: u32) -> Vec<Product> {
    (1..=n)
        .map(|i| Product {
            id: i.to_string(),
            name: format!("Product {i}"),
            status: if i % 2 == 0 { "Active" } else { "Pending" }.to_string(),
            price_cents: i * 100,
            updated_at: format!("2024-01-01T00:{:02}:{:02}Z", i / 60, i % 60),
        })
        .collect()
}

pub struct ProductHooks;

impl TableHooks<Product> for ProductHooks {
    fn class_name(&self) -> &str {
        "Product"
    }

    fn column_label(&self, name: &str) -> String {
        match name {
            "priceCents" => "Price".to_string(),
            "updatedAt" => "Last update".to_string(),
            other => other.to_string(),
        }
    }

    fn format_row(&self, row: &Product, display: &mut DisplayFields) {
        display.insert(
            "priceLabel".to_string(),
            format!("${}.{:02}", row.price_cents / 100, row.price_cents % 100),
        );
    }

    fn formalize(&self, row: &mut Product) {
        row.name = row.name.trim().to_string();
    }

    fn validate(&self, row: &Product) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require(!row.name.is_empty(), "name", "Name is required");
        errors.require(row.price_cents > 0, "priceCents", "Price must be positive");
        errors
    }
}

// ===== RecordingNotifier =====

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(NotificationKind, String)> {
        self.messages.lock().unwrap().clone()
    }

    fn of_kind(&self, kind: NotificationKind) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.of_kind(NotificationKind::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.of_kind(NotificationKind::Success)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.messages.lock().unwrap().push((kind, message.to_string()));
    }
}

// ===== ScriptedConfirmer =====

/// Answers prompts from a script, then with `default`.
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    default: AtomicBool,
    delay: Mutex<Duration>,
    requests: Mutex<Vec<ConfirmRequest>>,
}

impl ScriptedConfirmer {
    pub fn new(default: bool) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            default: AtomicBool::new(default),
            delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_answer(&self, answer: bool) {
        self.answers.lock().unwrap().push_back(answer);
    }

    /// Make every prompt wait this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<ConfirmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.answers.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.default.load(Ordering::SeqCst))
    }
}

// ===== FlakyBackend =====

/// `InMemoryBackend<Product>` with failure switches and per-call fetch delays.
pub struct FlakyBackend {
    inner: InMemoryBackend<Product>,
    fail_fetch: AtomicBool,
    fail_read: AtomicBool,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    reject_update: AtomicBool,
    fail_delete: AtomicBool,
    fetch_delays: Mutex<VecDeque<Duration>>,
    fetch_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new(rows: Vec<Product>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryBackend::new("Product", rows),
            fail_fetch: AtomicBool::new(false),
            fail_read: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            reject_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fetch_delays: Mutex::new(VecDeque::new()),
            fetch_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        })
    }

    pub fn fail_fetch(&self, on: bool) {
        self.fail_fetch.store(on, Ordering::SeqCst);
    }

    pub fn fail_read(&self, on: bool) {
        self.fail_read.store(on, Ordering::SeqCst);
    }

    pub fn fail_create(&self, on: bool) {
        self.fail_create.store(on, Ordering::SeqCst);
    }

    pub fn fail_update(&self, on: bool) {
        self.fail_update.store(on, Ordering::SeqCst);
    }

    /// Make `update` answer `Ok(false)`.
    pub fn reject_update(&self, on: bool) {
        self.reject_update.store(on, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, on: bool) {
        self.fail_delete.store(on, Ordering::SeqCst);
    }

    /// Delay the next fetches, one entry per call.
    pub fn queue_fetch_delay(&self, delay: Duration) {
        self.fetch_delays.lock().unwrap().push_back(delay);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Change a stored row behind the table's back.
    pub async fn overwrite(&self, row: Product) {
        self.inner.update(&row).await.unwrap();
    }

    pub async fn stored(&self, id: &str) -> Option<Product> {
        self.inner.read(id).await.ok()
    }
}

#[async_trait]
impl CrudBackend<Product> for FlakyBackend {
    fn class_name(&self) -> &str {
        self.inner.class_name()
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResult<Product>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.fetch_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(BackendError::Fetch("connection reset".to_string()));
        }
        self.inner.fetch_page(query).await
    }

    async fn read(&self, id: &str) -> Result<Product> {
        if self.fail_read.load(Ordering::SeqCst) {
            return Err(BackendError::NotFound { id: id.to_string() });
        }
        self.inner.read(id).await
    }

    async fn create(&self, row: &Product) -> Result<Product> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BackendError::Create("duplicate name".to_string()));
        }
        self.inner.create(row).await
    }

    async fn update(&self, row: &Product) -> Result<bool> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(BackendError::Update {
                id: row.id.clone(),
                detail: "write conflict".to_string(),
            });
        }
        if self.reject_update.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.update(row).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BackendError::Delete {
                id: id.to_string(),
                detail: "row is referenced".to_string(),
            });
        }
        self.inner.delete(id).await
    }
}

// ===== Factories =====

/// Context over `backend` with recording collaborators and default config.
pub fn test_context(
    backend: Arc<FlakyBackend>,
) -> (
    Arc<TableContext<Product>>,
    Arc<RecordingNotifier>,
    Arc<ScriptedConfirmer>,
) {
    let notifier = Arc::new(RecordingNotifier::new());
    let confirmer = Arc::new(ScriptedConfirmer::new(true));
    let ctx = Arc::new(TableContext::new(
        backend,
        Arc::new(ProductHooks),
        notifier.clone(),
        confirmer.clone(),
        TableConfig::default(),
    ));
    (ctx, notifier, confirmer)
}

/// Everything a controller test needs to drive and inspect a table.
pub struct Harness {
    pub controller: TableController<Product>,
    pub backend: Arc<FlakyBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirmer: Arc<ScriptedConfirmer>,
}

/// Unstarted controller over `rows`, sorted by ID ascending.
pub fn create_test_controller(rows: Vec<Product>) -> Harness {
    let config = TableConfig {
        sort_field: "id".to_string(),
        sort_direction: nested_table_backend::SortDirection::Asc,
        ..TableConfig::default()
    };
    create_test_controller_with(rows, config)
}

pub fn create_test_controller_with(rows: Vec<Product>, config: TableConfig) -> Harness {
    let backend = FlakyBackend::new(rows);
    let notifier = Arc::new(RecordingNotifier::new());
    let confirmer = Arc::new(ScriptedConfirmer::new(true));
    let controller = TableController::builder(backend.clone())
        .hooks(Arc::new(ProductHooks))
        .notifier(notifier.clone())
        .confirmer(confirmer.clone())
        .config(config)
        .build()
        .unwrap();
    Harness {
        controller,
        backend,
        notifier,
        confirmer,
    }
}
