//! Headless on-demand list driver.
//!
//! Builds a synthetic dataset behind an in-memory store, binds it to an
//! on-demand list laid out on a display-less surface, then replays a resize,
//! a sequence of scroll offsets and a refresh, printing the materialized
//! window and spacer heights after each step.
use anyhow::Result;
use clap::Parser;
use core_config::{ListConfig, load_from};
use core_events::{RefreshOptions, ScrollEvent, ViewportEvent};
use core_list::{FetchOutcome, ListError, OnDemandList};
use core_render::headless::{HeadlessLayout, HeadlessRenderer};
use core_store::MemoryStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "ondemand", version, about = "On-demand list window driver")]
struct Args {
    /// Rows in the synthetic dataset.
    #[arg(long, default_value_t = 1000)]
    items: usize,
    /// Fields per synthetic row.
    #[arg(long, default_value_t = 3)]
    fields: usize,
    /// Viewport height in pixels.
    #[arg(long = "viewport-height", default_value_t = 400.0)]
    viewport_height: f64,
    /// Pixel height each row is laid out at.
    #[arg(long = "row-height", default_value_t = 20.0)]
    row_height: f64,
    /// Scroll offset to visit; repeat for several steps.
    #[arg(long = "scroll")]
    scroll: Vec<f64>,
    /// Simulated store latency per response half.
    #[arg(long = "latency-ms", default_value_t = 0)]
    latency_ms: u64,
    /// Optional configuration file path (overrides discovery of `ondemand.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Print one JSON object per step instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Row {
    id: usize,
    fields: Vec<String>,
}

fn make_data(items: usize, fields: usize) -> Vec<Row> {
    (0..items)
        .map(|n| Row {
            id: n,
            fields: (0..fields).map(|i| format!("Data {n} - {i}")).collect(),
        })
        .collect()
}

type DemoList = OnDemandList<Row, MemoryStore<Row>, HeadlessRenderer<Row>, HeadlessLayout<Row>>;

#[derive(Debug, Serialize)]
struct StepReport {
    step: String,
    outcome: &'static str,
    window: [usize; 2],
    total_length: Option<usize>,
    row_height: f64,
    scroll_y: f64,
    leading: Option<f64>,
    trailing: Option<f64>,
    first_row: Option<Row>,
    last_row: Option<Row>,
}

impl StepReport {
    fn capture(
        step: String,
        outcome: &Result<FetchOutcome, ListError>,
        list: &DemoList,
        layout: &HeadlessLayout<Row>,
    ) -> Self {
        let state = list.state();
        let spacers = list.spacers();
        let surface = layout.snapshot();
        Self {
            step,
            outcome: outcome_label(outcome),
            window: [state.starting_index, state.end_index],
            total_length: state.total_length,
            row_height: state.row_height,
            scroll_y: surface.scroll.y,
            leading: spacers.map(|s| s.leading),
            trailing: spacers.map(|s| s.trailing),
            first_row: surface.rows.first().cloned(),
            last_row: surface.rows.last().cloned(),
        }
    }

    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
            return Ok(());
        }
        let ids = match (&self.first_row, &self.last_row) {
            (Some(first), Some(last)) => format!("rows {}..={}", first.id, last.id),
            _ => "no rows".to_string(),
        };
        println!(
            "{:<14} {:<9} window {:>5}..{:<5} {} spacers {:.0}/{:.0} px, row height {:.1}, scroll {:.0}",
            self.step,
            self.outcome,
            self.window[0],
            self.window[1],
            ids,
            self.leading.unwrap_or(0.0),
            self.trailing.unwrap_or(0.0),
            self.row_height,
            self.scroll_y,
        );
        Ok(())
    }
}

fn outcome_label(outcome: &Result<FetchOutcome, ListError>) -> &'static str {
    match outcome {
        Ok(FetchOutcome::Rendered(_)) => "rendered",
        Ok(FetchOutcome::Covered) => "covered",
        Ok(FetchOutcome::Stale { .. }) => "stale",
        Ok(FetchOutcome::Cancelled) => "cancelled",
        Ok(FetchOutcome::Unbound) => "unbound",
        Err(_) => "failed",
    }
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("ondemand.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "ondemand.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn build_list(args: &Args, config: ListConfig) -> (DemoList, HeadlessLayout<Row>) {
    let layout = HeadlessLayout::new(args.viewport_height, args.row_height);
    let store = MemoryStore::new(make_data(args.items, args.fields))
        .with_latency(Duration::from_millis(args.latency_ms));
    let list = OnDemandList::new(config, Some(store), layout.renderer(), layout.clone());
    (list, layout)
}

async fn run(args: Args) -> Result<()> {
    let config = load_from(args.config.clone())?;
    let list_config = config.effective();
    info!(
        target: "runtime.startup",
        items = args.items,
        viewport_height = args.viewport_height,
        config_loaded = config.raw.is_some(),
        rows_per_page = list_config.rows_per_page,
        "startup"
    );
    let (list, layout) = build_list(&args, list_config);

    let events = std::iter::once(ViewportEvent::Resize)
        .chain(args.scroll.iter().map(|y| ViewportEvent::Scroll(ScrollEvent::at(*y))))
        .chain(std::iter::once(ViewportEvent::Refresh(RefreshOptions::default())));

    let mut steps = Vec::with_capacity(args.scroll.len() + 2);
    for event in events {
        let label = match event {
            ViewportEvent::Resize => "resize".to_string(),
            ViewportEvent::Scroll(scroll) => {
                let y = scroll.scroll_top.unwrap_or(0.0);
                layout.set_scroll_y(y);
                format!("scroll {y}")
            }
            ViewportEvent::Refresh(_) => "refresh".to_string(),
        };
        let out = list.handle_event(event).await;
        if let Err(err) = &out {
            warn!(target: "runtime", error = %err, step = label.as_str(), "step_failed");
        }
        steps.push(StepReport::capture(label, &out, &list, &layout));
    }

    for step in &steps {
        step.print(args.json)?;
    }
    let m = list.metrics();
    info!(
        target: "runtime",
        issued = m.issued,
        covered = m.covered,
        rendered = m.rendered,
        failed = m.failed,
        "shutdown"
    );
    list.dispose();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    run(Args::parse()).await
}
