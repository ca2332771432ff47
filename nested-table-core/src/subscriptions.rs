//! Subscription registry
//!
//! Every long-lived task of a table (debounce gates, pagination listener,
//! external observers) is registered here and aborted by
//! [`SubscriptionRegistry::release_all`]. The same teardown signal cancels
//! in-flight suspension points wrapped with [`SubscriptionRegistry::guard`].

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{CoreError, CoreResult};

struct Subscription {
    name: String,
    handle: JoinHandle<()>,
}

pub struct SubscriptionRegistry {
    subscriptions: Mutex<Vec<Subscription>>,
    shutdown: watch::Sender<bool>,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            subscriptions: Mutex::new(Vec::new()),
            shutdown,
        }
    }

    /// Track a running task. After teardown the task is aborted on the spot.
    pub fn register(&self, name: impl Into<String>, handle: JoinHandle<()>) -> CoreResult<()> {
        let name = name.into();
        let mut subscriptions = self.lock();
        if self.is_closed() {
            handle.abort();
            log::debug!("Rejected subscription '{name}' after teardown");
            return Err(CoreError::ShutDown);
        }
        log::debug!("Registered subscription '{name}'");
        subscriptions.push(Subscription { name, handle });
        Ok(())
    }

    /// Spawn `fut` as a subscription that also stops on the teardown signal.
    pub fn spawn<F>(&self, name: impl Into<String>, fut: F) -> CoreResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            return Err(CoreError::ShutDown);
        }
        let closed = self.cancelled();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = fut => {}
                () = closed => {}
            }
        });
        self.register(name, handle)
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|s| s.name.clone()).collect()
    }

    /// Resolves once teardown has started.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            while !*rx.borrow_and_update() {
                // A dropped sender also means the table is gone.
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    /// Run `fut` unless teardown happens first.
    pub async fn guard<F: Future>(&self, fut: F) -> CoreResult<F::Output> {
        if self.is_closed() {
            return Err(CoreError::ShutDown);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(CoreError::ShutDown),
            out = fut => Ok(out),
        }
    }

    /// Abort every subscription and raise the teardown signal.
    ///
    /// Idempotent; returns how many subscriptions were released by this call.
    pub fn release_all(&self) -> usize {
        let released = {
            let mut subscriptions = self.lock();
            self.shutdown.send_replace(true);
            std::mem::take(&mut *subscriptions)
        };
        for subscription in &released {
            subscription.handle.abort();
            log::debug!("Released subscription '{}'", subscription.name);
        }
        released.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}
