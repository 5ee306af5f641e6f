//! In-memory range store.
//!
//! Holds its rows in a shared vector so clones observe the same data, which
//! lets a demo or test keep a handle for mutation while a list owns another.
//! With `with_latency` every half of a response sleeps first, standing in for
//! a remote store; without it responses resolve on first poll.

use crate::{RangeResponse, RangeStore, StoreError};
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::trace;

pub struct MemoryStore<T> {
    rows: Arc<RwLock<Vec<T>>>,
    latency: Option<Duration>,
    pending_failure: Arc<Mutex<Option<StoreError>>>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            latency: self.latency,
            pending_failure: self.pending_failure.clone(),
        }
    }
}

impl<T> MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            latency: None,
            pending_failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// Replace the row at `index`. Returns `false` when out of bounds.
    pub fn put(&self, index: usize, row: T) -> bool {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        match rows.get_mut(index) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, row: T) {
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    /// Make the next `fetch_range` fail with `err`.
    pub fn fail_next(&self, err: StoreError) {
        *self
            .pending_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    fn take_failure(&self) -> Option<StoreError> {
        self.pending_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

async fn simulate_latency(latency: Option<Duration>) {
    if let Some(d) = latency {
        tokio::time::sleep(d).await;
    }
}

impl<T> RangeStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fetch_range(&self, range: Range<usize>) -> RangeResponse<T> {
        trace!(target: "store.memory", start = range.start, end = range.end, "fetch_range");
        if let Some(err) = self.take_failure() {
            return RangeResponse::failed(err);
        }
        let latency = self.latency;
        let total_rows = self.rows.clone();
        let item_rows = self.rows.clone();
        RangeResponse {
            total_length: Box::pin(async move {
                simulate_latency(latency).await;
                let total = total_rows
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len();
                Ok::<_, StoreError>(total)
            }),
            items: Box::pin(async move {
                simulate_latency(latency).await;
                let rows = item_rows.read().unwrap_or_else(PoisonError::into_inner);
                let end = range.end.min(rows.len());
                let start = range.start.min(end);
                Ok::<_, StoreError>(rows[start..end].to_vec())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn slices_range_and_reports_total() {
        let store = MemoryStore::new((0..100u32).collect());
        let resp = store.fetch_range(10..15);
        assert_eq!(resp.total_length.await, Ok(100));
        assert_eq!(resp.items.await, Ok(vec![10, 11, 12, 13, 14]));
    }

    #[tokio::test]
    async fn range_past_end_is_truncated() {
        let store = MemoryStore::new((0..10u32).collect());
        assert_eq!(store.fetch_range(8..40).items.await, Ok(vec![8, 9]));
        assert_eq!(store.fetch_range(20..40).items.await, Ok(vec![]));
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let store = MemoryStore::new(vec![1u8, 2, 3]);
        store.fail_next(StoreError::Unavailable("down".into()));
        let failed = store.fetch_range(0..3);
        assert!(failed.total_length.await.is_err());
        assert_eq!(store.fetch_range(0..3).items.await, Ok(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn clones_share_rows() {
        let store = MemoryStore::new(vec!["a".to_string()]);
        let handle = store.clone();
        handle.push("b".to_string());
        assert!(handle.put(0, "z".to_string()));
        assert!(!handle.put(9, "nope".to_string()));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).as_deref(), Some("z"));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_resolution() {
        let store = MemoryStore::new(vec![1u8]).with_latency(Duration::from_millis(200));
        let start = tokio::time::Instant::now();
        let resp = store.fetch_range(0..1);
        assert_eq!(resp.items.await, Ok(vec![1]));
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
