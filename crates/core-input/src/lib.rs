//! Scroll/resize signal coalescing.
//!
//! Raw scroll callbacks fire far more often than a list can usefully page.
//! `Coalescer` sits between the signal source and the window calculator and
//! reduces each burst to one handler call, either after the burst goes quiet
//! (`PagingPolicy::Debounce`) or once per delay window with a guaranteed
//! trailing call (`PagingPolicy::ThrottleDelayed`).

mod coalescer;
pub use coalescer::{Coalescer, CoalescerMetrics, CoalescerMetricsSnapshot, PagingPolicy};

#[inline]
pub(crate) fn log_burst_fired(policy: &'static str, superseded: u64) {
    tracing::trace!(target: "input.coalesce", policy, superseded, "burst_fired");
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn burst_fired_log_carries_policy_and_count() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            super::log_burst_fired("debounce", 4);
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("input.coalesce"), "{out}");
        assert!(out.contains("policy=\"debounce\""), "{out}");
        assert!(out.contains("superseded=4"), "{out}");
    }
}
