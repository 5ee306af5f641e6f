//! The windowing engine.
//!
//! `OnDemandList` composes the pure window arithmetic from `core-render` with
//! three collaborators: a `RangeStore` it reads rows from, a `RowRenderer` it
//! hands settled windows to, and a `MeasurementProvider` it reads viewport
//! geometry from. It owns the only `ViewportState` for the instance.
//!
//! Lifecycle of a window change:
//! `scroll/resize -> (coalescer) -> calculate -> {covered | fetch} -> commit`.
//! A fetch commits only while its generation is the latest issued, so a
//! slower, older fetch never overwrites a newer window. Locks are never held
//! across an await; the store and renderer only ever see settled values.

use crate::coordinator::{FetchCoordinator, Resolution};
use crate::error::{ErrorReporter, ListError, TracingErrorReporter};
use crate::metrics::{ListMetrics, ListMetricsSnapshot};
use core_config::ListConfig;
use core_events::{RefreshOptions, ScrollEvent, ScrollPosition, ViewportEvent};
use core_input::{Coalescer, PagingPolicy};
use core_model::{FetchRange, RenderWindow, RowExtent, SpacerHeights, ViewportState};
use core_render::estimator::{RowHeightEstimator, RowHeightRule, distance_to_next};
use core_render::spacer::size_spacers;
use core_render::viewport::{WindowDecision, WindowInput, compute_window, first_page};
use core_render::{MeasurementProvider, RowRenderer};
use core_store::RangeStore;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, trace, warn};

/// How a window change ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The range was fetched and handed to the renderer.
    Rendered(FetchRange),
    /// The rendered window already covered the needed rows; nothing fetched.
    Covered,
    /// The fetch settled after a newer one was issued and was discarded.
    Stale { generation: u64 },
    /// A refresh or dispose cancelled the fetch while it was in flight.
    Cancelled,
    /// No store is bound.
    Unbound,
}

#[derive(Debug, Default)]
struct Inner {
    viewport: ViewportState,
    spacers: Option<SpacerHeights>,
    estimator: RowHeightEstimator,
}

pub struct OnDemandList<T, S, R, M> {
    config: ListConfig,
    store: RwLock<Option<Arc<S>>>,
    renderer: Mutex<R>,
    measure: M,
    inner: Mutex<Inner>,
    coordinator: FetchCoordinator,
    reporter: Box<dyn ErrorReporter>,
    row_rule: Box<RowHeightRule>,
    metrics: ListMetrics,
    disposed: AtomicBool,
    _rows: PhantomData<fn() -> T>,
}

impl<T, S, R, M> OnDemandList<T, S, R, M>
where
    T: Send + 'static,
    S: RangeStore<T>,
    R: RowRenderer<T>,
    M: MeasurementProvider,
{
    pub fn new(config: ListConfig, store: Option<S>, renderer: R, measure: M) -> Self {
        let config = config.validated();
        debug!(
            target: "list.window",
            rows_per_page = config.rows_per_page,
            buffer_rows = config.buffer_rows,
            bound = store.is_some(),
            "list_created"
        );
        Self {
            coordinator: FetchCoordinator::new(config.fetch_timeout()),
            config,
            store: RwLock::new(store.map(Arc::new)),
            renderer: Mutex::new(renderer),
            measure,
            inner: Mutex::new(Inner::default()),
            reporter: Box::new(TracingErrorReporter),
            row_rule: Box::new(distance_to_next),
            metrics: ListMetrics::default(),
            disposed: AtomicBool::new(false),
            _rows: PhantomData,
        }
    }

    /// Route failures of coalesced scroll handling to `reporter`.
    pub fn with_error_reporter(mut self, reporter: impl ErrorReporter) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Replace the per-row height rule used when estimating the row height.
    pub fn with_row_height_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&RowExtent, Option<&RowExtent>) -> f64 + Send + Sync + 'static,
    {
        self.row_rule = Box::new(rule);
        self
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn state(&self) -> ViewportState {
        self.lock_inner().viewport
    }

    pub fn spacers(&self) -> Option<SpacerHeights> {
        self.lock_inner().spacers
    }

    pub fn metrics(&self) -> ListMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_bound(&self) -> bool {
        self.current_store().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispatch a host event to the matching operation.
    pub async fn handle_event(&self, event: ViewportEvent) -> Result<FetchOutcome, ListError> {
        match event {
            ViewportEvent::Scroll(scroll) => self.handle_scroll(scroll).await,
            ViewportEvent::Resize => self.resize().await,
            ViewportEvent::Refresh(options) => self.refresh(options).await,
        }
    }

    /// The viewport was resized (or first attached): recompute the window at
    /// the current scroll offset.
    pub async fn resize(&self) -> Result<FetchOutcome, ListError> {
        self.ensure_live()?;
        trace!(target: "list.window", "resize");
        self.process_scroll(None).await
    }

    /// Handle one (already coalesced) scroll signal.
    pub async fn handle_scroll(&self, event: ScrollEvent) -> Result<FetchOutcome, ListError> {
        self.process_scroll(event.observed_top()).await
    }

    /// Recompute the window for scroll offset `scroll_top`, or for the
    /// measured offset when `None`.
    pub async fn process_scroll(
        &self,
        scroll_top: Option<f64>,
    ) -> Result<FetchOutcome, ListError> {
        self.ensure_live()?;
        let Some(viewport_height) = self.measure.measurable_height() else {
            let page = first_page(self.config.rows_per_page, None);
            debug!(target: "list.window", start = page.start, end = page.end, "viewport_unmeasurable");
            return self.render_range(page.start, page.end).await;
        };
        self.ensure_row_height();

        let decision = {
            let mut inner = self.lock_inner();
            let y = scroll_top
                .filter(|y| y.is_finite())
                .unwrap_or_else(|| self.measure.scroll_position().y);
            inner.viewport.scroll_offset_y = if y.is_finite() { y.max(0.0) } else { 0.0 };
            let vp = inner.viewport;
            compute_window(&WindowInput {
                scroll_top: vp.scroll_offset_y,
                viewport_height: Some(viewport_height),
                row_height: vp.row_height,
                total_length: vp.total_length,
                current: vp.window(),
                rows_per_page: self.config.rows_per_page,
                buffer_rows: self.config.buffer_rows,
                coverage: self.config.coverage,
            })
        };

        match decision {
            WindowDecision::Covered { needed } => {
                self.metrics.incr_covered();
                trace!(target: "list.window", start = needed.start, end = needed.end, "window_covered");
                Ok(FetchOutcome::Covered)
            }
            WindowDecision::FirstPage(range) => {
                debug!(target: "list.window", start = range.start, end = range.end, "first_page");
                self.render_range(range.start, range.end).await
            }
            WindowDecision::Fetch { range, needed } => {
                debug!(
                    target: "list.window",
                    needed_start = needed.start,
                    needed_end = needed.end,
                    start = range.start,
                    end = range.end,
                    "window_fetch"
                );
                self.render_range(range.start, range.end).await
            }
        }
    }

    /// Fetch `[start, end)` and render it if it is still the latest request
    /// once both the rows and the total length have arrived.
    pub async fn render_range(&self, start: usize, end: usize) -> Result<FetchOutcome, ListError> {
        self.ensure_live()?;
        let Some(store) = self.current_store() else {
            debug!(target: "list.fetch", start, end, "no_store_bound");
            return Ok(FetchOutcome::Unbound);
        };
        let range = self.coordinator.issue(start..end);
        self.metrics.incr_issued();
        debug!(
            target: "list.fetch",
            start = range.start,
            end = range.end,
            generation = range.generation,
            "fetch_issued"
        );
        let response = store.fetch_range(range.as_range());
        drop(store);

        match self.coordinator.resolve(&range, response).await {
            Ok(Resolution::Fetched { total_length, rows }) => {
                Ok(self.commit(range, total_length, rows))
            }
            Ok(Resolution::Cancelled) => {
                self.metrics.incr_cancelled();
                debug!(target: "list.fetch", generation = range.generation, "fetch_cancelled");
                Ok(FetchOutcome::Cancelled)
            }
            Err(err) => {
                self.metrics.incr_failed();
                warn!(
                    target: "list.fetch",
                    start = range.start,
                    end = range.end,
                    error = %err,
                    "fetch_failed"
                );
                Err(err)
            }
        }
    }

    /// Reload the window from scratch.
    ///
    /// Cancels in-flight fetches, clears the renderer and scrolls to the top.
    /// When keeping the scroll position (per call, else per instance), the
    /// saved offset is restored once the first page has settled and the
    /// window is recomputed for it.
    pub async fn refresh(&self, options: RefreshOptions) -> Result<FetchOutcome, ListError> {
        self.ensure_live()?;
        let keep = options.resolve_keep(self.config.keep_scroll_position);
        let saved = keep.then(|| self.measure.scroll_position());
        info!(target: "list.window", keep, saved_y = saved.map(|p| p.y), "refresh");

        self.coordinator.cancel_all();
        {
            let mut inner = self.lock_inner();
            inner.viewport.reset_window();
            inner.spacers = None;
        }
        self.lock_renderer().clear();
        self.measure.scroll_to(ScrollPosition::TOP);

        let first = self.process_scroll(Some(0.0)).await?;
        let (FetchOutcome::Rendered(_), Some(position)) = (first, saved) else {
            return Ok(first);
        };
        if position == ScrollPosition::TOP {
            return Ok(first);
        }
        self.measure.scroll_to(position);
        debug!(target: "list.window", y = position.y, "scroll_restored");
        match self.process_scroll(Some(position.y)).await? {
            restored @ FetchOutcome::Rendered(_) => Ok(restored),
            _ => Ok(first),
        }
    }

    /// Bind a different store (or none) and refresh against it.
    pub async fn set_store(&self, store: Option<S>) -> Result<FetchOutcome, ListError> {
        self.ensure_live()?;
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = store.map(Arc::new);
        self.refresh(RefreshOptions::default()).await
    }

    /// Stop the instance: in-flight fetches resolve as `Cancelled` and every
    /// later call fails with `ListError::Disposed`. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(target: "list.window", "list_disposed");
        self.coordinator.cancel_all();
    }

    /// Spawn a coalescer configured from this instance's paging settings that
    /// feeds scroll events into `handle_scroll`. Failures go to the error
    /// reporter. The coalescer holds only a weak reference to the list.
    pub fn attach_coalescer(self: &Arc<Self>) -> Coalescer<ScrollEvent>
    where
        S: 'static,
        R: 'static,
        M: 'static,
    {
        let policy = PagingPolicy::from_config(&self.config);
        debug!(target: "list.window", delay_ms = policy.delay().as_millis() as u64, "coalescer_attached");
        let list = Arc::downgrade(self);
        Coalescer::spawn(policy, move |event: ScrollEvent| {
            let list = list.clone();
            async move {
                let Some(list) = list.upgrade() else {
                    return;
                };
                if list.is_disposed() {
                    return;
                }
                if let Err(err) = list.handle_scroll(event).await {
                    list.reporter.report(&err);
                }
            }
        })
    }

    fn commit(&self, range: FetchRange, total_length: usize, rows: Vec<T>) -> FetchOutcome {
        let needs_estimate = {
            let mut inner = self.lock_inner();
            if !self.coordinator.is_current(&range) {
                self.metrics.incr_stale();
                debug!(
                    target: "list.fetch",
                    generation = range.generation,
                    latest = self.coordinator.latest(),
                    "stale_fetch_discarded"
                );
                return FetchOutcome::Stale {
                    generation: range.generation,
                };
            }
            inner.viewport.apply_fetch(&range, total_length);
            let spacers = size_spacers(
                &range.as_range(),
                Some(total_length),
                inner.viewport.row_height,
                self.config.default_row_height,
            );
            inner.spacers = spacers;
            debug!(
                target: "list.fetch",
                start = range.start,
                end = range.end,
                rows = rows.len(),
                total_length,
                "window_rendered"
            );
            self.lock_renderer()
                .render_window(RenderWindow::new(range, rows, spacers));
            self.metrics.incr_rendered();
            !inner.viewport.has_row_height()
        };
        if needs_estimate {
            self.ensure_row_height();
            self.resize_spacers();
        }
        FetchOutcome::Rendered(range)
    }

    /// Sample rendered rows while no row height is known. A degenerate
    /// sample leaves the height pending.
    fn ensure_row_height(&self) {
        if self.lock_inner().viewport.has_row_height() {
            return;
        }
        let rows = self.measure.rendered_rows();
        let mut inner = self.lock_inner();
        let estimate = inner.estimator.sample_with(&rows, &*self.row_rule);
        if estimate > 0.0 {
            inner.viewport.row_height = estimate;
        }
    }

    /// Re-size the placeholders once a measured height replaces the default.
    fn resize_spacers(&self) {
        let mut inner = self.lock_inner();
        let vp = inner.viewport;
        if !vp.has_row_height() || inner.spacers.is_none() {
            return;
        }
        let spacers = size_spacers(
            &vp.window(),
            vp.total_length,
            vp.row_height,
            self.config.default_row_height,
        );
        if spacers == inner.spacers {
            return;
        }
        trace!(target: "list.measure", row_height = vp.row_height, "spacers_resized");
        inner.spacers = spacers;
        self.lock_renderer().resize_spacers(spacers);
    }

    fn ensure_live(&self) -> Result<(), ListError> {
        if self.is_disposed() {
            return Err(ListError::Disposed);
        }
        Ok(())
    }

    fn current_store(&self) -> Option<Arc<S>> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_renderer(&self) -> MutexGuard<'_, R> {
        self.renderer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, S, R, M> Drop for OnDemandList<T, S, R, M> {
    fn drop(&mut self) {
        self.coordinator.cancel_all();
    }
}
