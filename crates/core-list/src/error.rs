//! Error types and the error-reporting channel.
//!
//! Direct calls (`resize`, `refresh`, `render_range`, ...) return their
//! failures. Calls driven by the coalescer have no caller to return to, so
//! their failures go through the list's `ErrorReporter` instead.

use core_store::StoreError;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("fetch of {start}..{end} timed out after {after_ms}ms")]
    Timeout {
        start: usize,
        end: usize,
        after_ms: u64,
    },
    #[error("list has been disposed")]
    Disposed,
}

/// Sink for failures that have no direct caller.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, err: &ListError);
}

/// Default reporter: logs each failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, err: &ListError) {
        warn!(target: "list.fetch", error = %err, "list_error");
    }
}

/// Forwards failures into a channel the host drains.
#[derive(Debug, Clone)]
pub struct ChannelErrorReporter {
    tx: mpsc::UnboundedSender<ListError>,
}

impl ChannelErrorReporter {
    pub fn new(tx: mpsc::UnboundedSender<ListError>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ListError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ErrorReporter for ChannelErrorReporter {
    fn report(&self, err: &ListError) {
        if self.tx.send(err.clone()).is_err() {
            warn!(target: "list.fetch", error = %err, "error_channel_closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_is_transparent() {
        let err = ListError::from(StoreError::Unavailable("offline".into()));
        assert_eq!(err.to_string(), "store unavailable: offline");
    }

    #[test]
    fn channel_reporter_forwards() {
        let (reporter, mut rx) = ChannelErrorReporter::channel();
        reporter.report(&ListError::Disposed);
        assert_eq!(rx.try_recv().ok(), Some(ListError::Disposed));
    }

    #[test]
    fn timeout_message_names_range() {
        let err = ListError::Timeout {
            start: 40,
            end: 85,
            after_ms: 250,
        };
        assert_eq!(err.to_string(), "fetch of 40..85 timed out after 250ms");
    }
}
