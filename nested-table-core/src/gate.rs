//! Input gates: debounce and single-flight
//!
//! A [`DebounceGate`] collapses a burst of events into the last one, emitted
//! once the input has been quiet for a full window. A [`SingleFlight`] flag
//! rejects re-entrant work instead of queueing it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Single-slot debounce gate; the latest event wins.
///
/// The handler runs on the gate's own task. A plain gate holds events
/// submitted while the handler is running and debounces them afterwards; an
/// exclusive gate ([`DebounceGate::spawn_exclusive`]) drops them. Dropping
/// the gate (or aborting its task) drops a pending event without running the
/// handler.
pub struct DebounceGate<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E: Send + 'static> DebounceGate<E> {
    /// Spawn the gate task. The returned handle belongs in a
    /// [`SubscriptionRegistry`](crate::SubscriptionRegistry).
    pub fn spawn<F, Fut>(name: impl Into<String>, window: Duration, handler: F) -> (Self, JoinHandle<()>)
    where
        F: FnMut(E) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::spawn_with(name.into(), window, false, handler)
    }

    /// Like [`DebounceGate::spawn`], but events that arrive while the handler
    /// is running are discarded instead of queued.
    pub fn spawn_exclusive<F, Fut>(
        name: impl Into<String>,
        window: Duration,
        handler: F,
    ) -> (Self, JoinHandle<()>)
    where
        F: FnMut(E) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::spawn_with(name.into(), window, true, handler)
    }

    fn spawn_with<F, Fut>(
        name: String,
        window: Duration,
        drop_while_busy: bool,
        mut handler: F,
    ) -> (Self, JoinHandle<()>)
    where
        F: FnMut(E) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<E>();

        let handle = tokio::spawn(async move {
            let mut pending: Option<E> = None;
            loop {
                if pending.is_none() {
                    match rx.recv().await {
                        Some(event) => pending = Some(event),
                        None => break,
                    }
                    continue;
                }

                tokio::select! {
                    next = rx.recv() => match next {
                        Some(event) => pending = Some(event),
                        None => break,
                    },
                    () = tokio::time::sleep(window) => {
                        if let Some(event) = pending.take() {
                            handler(event).await;
                        }
                        if drop_while_busy {
                            let mut dropped = 0usize;
                            while rx.try_recv().is_ok() {
                                dropped += 1;
                            }
                            if dropped > 0 {
                                log::debug!("Debounce gate '{name}' dropped {dropped} events received while busy");
                            }
                        }
                    }
                }
            }
            log::debug!("Debounce gate '{name}' closed");
        });

        (Self { tx }, handle)
    }

    /// Queue an event. Returns `false` once the gate task is gone.
    pub fn submit(&self, event: E) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Returns `true` if a settled search of `len` characters should reload.
pub fn search_triggers(len: usize, min_len: usize) -> bool {
    len == 0 || len >= min_len
}

/// Re-entrancy flag shared by all transitions of one table.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or `None` if some other work holds it.
    pub fn try_acquire(&self) -> Option<FlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the single-flight flag; releases it on drop, including on cancellation.
#[derive(Debug)]
pub struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::sleep;

    fn recording_gate(window_ms: u64) -> (DebounceGate<u32>, JoinHandle<()>, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (gate, handle) = DebounceGate::spawn("test", Duration::from_millis(window_ms), move |e| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(e);
            }
        });
        (gate, handle, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_event() {
        let (gate, _handle, seen) = recording_gate(500);
        for n in 1..=4 {
            assert!(gate.submit(n));
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_millis(600)).await;
        assert_eq!(*seen.lock().unwrap(), [4]);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_window_restarts_on_each_event() {
        let (gate, _handle, seen) = recording_gate(500);
        gate.submit(1);
        sleep(Duration::from_millis(400)).await;
        gate.submit(2);
        sleep(Duration::from_millis(400)).await;
        assert!(seen.lock().unwrap().is_empty());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(*seen.lock().unwrap(), [2]);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_fire_separately() {
        let (gate, _handle, seen) = recording_gate(500);
        gate.submit(1);
        sleep(Duration::from_millis(700)).await;
        gate.submit(2);
        sleep(Duration::from_millis(700)).await;
        assert_eq!(*seen.lock().unwrap(), [1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_gate_discards_pending_event() {
        let (gate, handle, seen) = recording_gate(500);
        gate.submit(1);
        sleep(Duration::from_millis(10)).await;
        drop(gate);
        handle.await.unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_gate_rejects_submissions() {
        let (gate, handle, _seen) = recording_gate(500);
        handle.abort();
        let _ = handle.await;
        assert!(!gate.submit(1));
    }

    #[tokio::test(start_paused = true)]
    async fn exclusive_gate_drops_events_while_busy() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (gate, _handle) = DebounceGate::spawn_exclusive("busy", Duration::from_millis(500), move |e: u32| {
            let sink = Arc::clone(&sink);
            async move {
                sleep(Duration::from_secs(2)).await;
                sink.lock().unwrap().push(e);
            }
        });

        gate.submit(1);
        sleep(Duration::from_millis(600)).await;
        gate.submit(2);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), [1]);

        gate.submit(3);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(*seen.lock().unwrap(), [1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_gate_holds_events_while_busy() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (gate, _handle) = DebounceGate::spawn("queueing", Duration::from_millis(500), move |e: u32| {
            let sink = Arc::clone(&sink);
            async move {
                sleep(Duration::from_secs(2)).await;
                sink.lock().unwrap().push(e);
            }
        });

        gate.submit(1);
        sleep(Duration::from_millis(600)).await;
        gate.submit(2);
        sleep(Duration::from_secs(5)).await;
        assert_eq!(*seen.lock().unwrap(), [1, 2]);
    }

    #[test]
    fn search_length_rule() {
        assert!(search_triggers(0, 2));
        assert!(!search_triggers(1, 2));
        assert!(search_triggers(2, 2));
        assert!(search_triggers(7, 2));
    }

    #[test]
    fn single_flight_rejects_reentry() {
        let flight = SingleFlight::new();
        let guard = flight.try_acquire().unwrap();
        assert!(flight.is_busy());
        assert!(flight.clone().try_acquire().is_none());
        drop(guard);
        assert!(!flight.is_busy());
        assert!(flight.try_acquire().is_some());
    }
}
