//! Range fetch coordination.
//!
//! Every issued `FetchRange` is stamped with the next generation. A fetch
//! resolves only once both the total length and the rows have arrived; the
//! caller then commits it if, and only if, its generation is still the latest
//! issued. This keeps an older, slower fetch from overwriting the window of a
//! newer one.
//!
//! `cancel_all` advances the generation (so anything in flight is stale) and
//! wakes all in-flight resolutions, which return `Resolution::Cancelled`.

use crate::error::ListError;
use core_model::FetchRange;
use core_store::RangeResponse;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug)]
pub enum Resolution<T> {
    Fetched { total_length: usize, rows: Vec<T> },
    Cancelled,
}

#[derive(Debug, Default)]
pub struct FetchCoordinator {
    generation: AtomicU64,
    cancel: Notify,
    timeout: Option<Duration>,
}

impl FetchCoordinator {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            generation: AtomicU64::new(0),
            cancel: Notify::new(),
            timeout,
        }
    }

    /// Stamp `range` with a fresh generation.
    pub fn issue(&self, range: Range<usize>) -> FetchRange {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        FetchRange::new(range.start, range.end, generation)
    }

    pub fn latest(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, range: &FetchRange) -> bool {
        range.generation == self.latest()
    }

    /// Invalidate and wake everything in flight.
    pub fn cancel_all(&self) {
        let superseded = self.generation.fetch_add(1, Ordering::AcqRel);
        debug!(target: "list.fetch", superseded, "fetches_cancelled");
        self.cancel.notify_waiters();
    }

    /// Await both halves of `response`, bounded by the configured timeout.
    pub async fn resolve<T>(
        &self,
        range: &FetchRange,
        response: RangeResponse<T>,
    ) -> Result<Resolution<T>, ListError> {
        let cancelled = self.cancel.notified();
        let settled = self.settle(range, response);
        tokio::select! {
            biased;
            _ = cancelled => Ok(Resolution::Cancelled),
            res = settled => {
                let (total_length, rows) = res?;
                Ok(Resolution::Fetched { total_length, rows })
            }
        }
    }

    async fn settle<T>(
        &self,
        range: &FetchRange,
        response: RangeResponse<T>,
    ) -> Result<(usize, Vec<T>), ListError> {
        let RangeResponse {
            total_length,
            items,
        } = response;
        let both = async { tokio::try_join!(total_length, items).map_err(ListError::from) };
        match self.timeout {
            None => both.await,
            Some(limit) => tokio::time::timeout(limit, both)
                .await
                .map_err(|_| ListError::Timeout {
                    start: range.start,
                    end: range.end,
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })?,
        }
    }
}
