//! Backing-store contract for on-demand lists.
//!
//! A store answers range queries. Each answer is a pair of independent
//! futures: the dataset's total length and the ordered rows of the requested
//! half-open range. Either may resolve first; the list awaits both before it
//! treats the window as settled.
//!
//! Stores may be shared by several lists; the list only ever reads through
//! `fetch_range`.

mod memory;
pub use memory::MemoryStore;

use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by stores. `'static` so fetches can outlive the call
/// that issued them.
pub type StoreFuture<V> = Pin<Box<dyn Future<Output = Result<V, StoreError>> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store rejected range {start}..{end}: {reason}")]
    Rejected {
        start: usize,
        end: usize,
        reason: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub struct RangeResponse<T> {
    pub total_length: StoreFuture<usize>,
    pub items: StoreFuture<Vec<T>>,
}

impl<T: Send + 'static> RangeResponse<T> {
    /// Both halves already resolved.
    pub fn ready(total_length: usize, items: Vec<T>) -> Self {
        Self {
            total_length: Box::pin(async move { Ok::<_, StoreError>(total_length) }),
            items: Box::pin(async move { Ok::<_, StoreError>(items) }),
        }
    }

    /// Both halves fail with `err`.
    pub fn failed(err: StoreError) -> Self {
        let total_err = err.clone();
        Self {
            total_length: Box::pin(async move { Err::<usize, _>(total_err) }),
            items: Box::pin(async move { Err::<Vec<T>, _>(err) }),
        }
    }
}

impl<T> std::fmt::Debug for RangeResponse<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeResponse").finish_non_exhaustive()
    }
}

/// A range-queryable dataset.
pub trait RangeStore<T>: Send + Sync + 'static {
    fn fetch_range(&self, range: Range<usize>) -> RangeResponse<T>;
}

impl<T, S> RangeStore<T> for Arc<S>
where
    S: RangeStore<T> + ?Sized,
{
    fn fetch_range(&self, range: Range<usize>) -> RangeResponse<T> {
        (**self).fetch_range(range)
    }
}
