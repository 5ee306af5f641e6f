use crate::log_burst_fired;
use core_config::{ListConfig, PagingMethod};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, trace};

/// How a burst of events is reduced to handler invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingPolicy {
    /// Fire once `delay` has elapsed since the last event of the burst.
    Debounce(Duration),
    /// Fire at most once per `delay`, at the end of each window, with the
    /// latest event seen in it.
    ThrottleDelayed(Duration),
}

impl PagingPolicy {
    pub fn from_config(cfg: &ListConfig) -> Self {
        match cfg.paging_method {
            PagingMethod::Debounce => PagingPolicy::Debounce(cfg.paging_delay()),
            PagingMethod::ThrottleDelayed => PagingPolicy::ThrottleDelayed(cfg.paging_delay()),
        }
    }

    pub fn delay(&self) -> Duration {
        match self {
            PagingPolicy::Debounce(d) | PagingPolicy::ThrottleDelayed(d) => *d,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PagingPolicy::Debounce(_) => "debounce",
            PagingPolicy::ThrottleDelayed(_) => "throttle_delayed",
        }
    }
}

#[derive(Debug, Default)]
pub struct CoalescerMetrics {
    received: AtomicU64,
    coalesced: AtomicU64,
    fired: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoalescerMetricsSnapshot {
    /// Events accepted by `schedule`.
    pub received: u64,
    /// Events superseded by a later one in the same burst.
    pub coalesced: u64,
    /// Handler invocations started.
    pub fired: u64,
}

impl CoalescerMetrics {
    pub fn snapshot(&self) -> CoalescerMetricsSnapshot {
        use std::sync::atomic::Ordering::Relaxed;
        CoalescerMetricsSnapshot {
            received: self.received.load(Relaxed),
            coalesced: self.coalesced.load(Relaxed),
            fired: self.fired.load(Relaxed),
        }
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Owns a background task that turns scheduled events into coalesced handler
/// invocations.
///
/// Handler invocations run on their own tasks so a slow handler never delays
/// coalescing of the next burst. `dispose` (or dropping the coalescer) aborts
/// outstanding invocations; nothing fires afterwards.
pub struct Coalescer<E> {
    tx: mpsc::UnboundedSender<E>,
    shutdown: Arc<Notify>,
    disposed: AtomicBool,
    metrics: Arc<CoalescerMetrics>,
    policy: PagingPolicy,
    task: Option<JoinHandle<()>>,
}

impl<E> Coalescer<E>
where
    E: Send + 'static,
{
    /// Spawn the coalescing task on the current Tokio runtime.
    pub fn spawn<H, Fut>(policy: PagingPolicy, handler: H) -> Self
    where
        H: FnMut(E) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let metrics = Arc::new(CoalescerMetrics::default());
        let task = tokio::spawn(
            CoalescerTask {
                rx,
                policy,
                handler,
                shutdown: ShutdownListener {
                    notify: shutdown.clone(),
                },
                metrics: metrics.clone(),
                in_flight: JoinSet::new(),
            }
            .run(),
        );
        Self {
            tx,
            shutdown,
            disposed: AtomicBool::new(false),
            metrics,
            policy,
            task: Some(task),
        }
    }

    /// Queue an event. Returns `false` once the coalescer is disposed.
    pub fn schedule(&self, event: E) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            return false;
        }
        if self.tx.send(event).is_err() {
            return false;
        }
        self.metrics.received.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Stop the task and abort in-flight invocations. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(target: "input.coalesce", policy = self.policy.as_str(), "coalescer_disposed");
        self.shutdown.notify_one();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> PagingPolicy {
        self.policy
    }

    pub fn metrics_snapshot(&self) -> CoalescerMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispose and wait for the background task to exit.
    pub async fn shutdown(mut self) {
        self.dispose();
        if let Some(task) = self.task.take()
            && let Err(join_err) = task.await
        {
            debug!(target: "input.coalesce", ?join_err, "coalescer_join_failed");
        }
    }
}

impl<E> Drop for Coalescer<E> {
    fn drop(&mut self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.shutdown.notify_one();
        }
    }
}

struct CoalescerTask<E, H> {
    rx: mpsc::UnboundedReceiver<E>,
    policy: PagingPolicy,
    handler: H,
    shutdown: ShutdownListener,
    metrics: Arc<CoalescerMetrics>,
    in_flight: JoinSet<()>,
}

impl<E, H, Fut> CoalescerTask<E, H>
where
    E: Send + 'static,
    H: FnMut(E) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(mut self) {
        trace!(target: "input.coalesce", policy = self.policy.as_str(), "coalescer_started");
        while let Some(first) = self.next_burst().await {
            let Some((latest, superseded)) = self.collect_burst(first).await else {
                break;
            };
            self.metrics.fired.fetch_add(1, Ordering::Relaxed);
            log_burst_fired(self.policy.as_str(), superseded);
            self.in_flight.spawn((self.handler)(latest));
        }
        self.in_flight.abort_all();
        trace!(target: "input.coalesce", "coalescer_stopped");
    }

    /// Wait for the first event of a burst, reaping finished invocations
    /// meanwhile. `None` on shutdown or channel closure.
    async fn next_burst(&mut self) -> Option<E> {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => return None,
                ev = self.rx.recv() => return ev,
                Some(_) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {}
            }
        }
    }

    /// Absorb events until the policy's deadline passes. Returns the event to
    /// fire and the number it superseded, or `None` on shutdown/closure.
    async fn collect_burst(&mut self, first: E) -> Option<(E, u64)> {
        let delay = self.policy.delay();
        let mut latest = first;
        let mut superseded = 0u64;
        let mut deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => return None,
                ev = self.rx.recv() => {
                    latest = ev?;
                    superseded += 1;
                    self.metrics.coalesced.fetch_add(1, Ordering::Relaxed);
                    if let PagingPolicy::Debounce(_) = self.policy {
                        deadline = Instant::now() + delay;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => return Some((latest, superseded)),
            }
        }
    }
}
