//! On-demand list engine.
//!
//! Exposed Components:
//! - `OnDemandList`: binds a range-queryable store, a renderer and a
//!   measurement provider, and keeps only the rows around the viewport
//!   materialized.
//! - `FetchCoordinator`: generation-stamped range fetches with optional
//!   timeout and bulk cancellation.
//! - `ListError` / `ErrorReporter`: failures of direct calls are returned;
//!   failures of coalesced scroll handling go to the reporter.
//! - `ListMetrics`: per-instance counters.

pub mod coordinator;
pub mod error;
mod list;
pub mod metrics;

pub use coordinator::{FetchCoordinator, Resolution};
pub use error::{ChannelErrorReporter, ErrorReporter, ListError, TracingErrorReporter};
pub use list::{FetchOutcome, OnDemandList};
pub use metrics::{ListMetrics, ListMetricsSnapshot};
