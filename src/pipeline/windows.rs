//! Aggregation windows for tx volume counting
//!
//! Each window is a fixed-duration counter. The ingestion loop increments
//! every window once per tx-hash event; each window's scheduler drains it
//! on its own period. Windows never derive from one another.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Concurrency-safe counting bucket.
///
/// `increment` and `drain_and_reset` are single atomic RMW operations on
/// the same counter, so every increment lands in exactly one drain.
#[derive(Debug)]
pub struct AggregationWindow {
    duration: Duration,
    count: AtomicU64,
}

impl AggregationWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            count: AtomicU64::new(0),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Metric name reported for this window, e.g. `tx_count_last_10s`
    pub fn metric_name(&self) -> String {
        format!("tx_count_last_{}s", self.duration.as_secs())
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Read the count and reset it to zero in one indivisible step
    pub fn drain_and_reset(&self) -> u64 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Current count without draining
    pub fn peek(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// The configured windows, shared between the router and the schedulers
#[derive(Debug, Clone, Default)]
pub struct WindowSet {
    windows: Vec<Arc<AggregationWindow>>,
}

impl WindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One window per distinct duration, in the given order. Durations
    /// under one second are dropped: they cannot drive a tick interval and
    /// have no `tx_count_last_{N}s` label.
    pub fn from_durations(durations: &[Duration]) -> Self {
        let mut set = Self::new();
        for duration in durations {
            if duration.as_secs() == 0 {
                log::warn!("Ignoring sub-second window duration {:?}", duration);
                continue;
            }
            if set.get(*duration).is_none() {
                set.windows.push(Arc::new(AggregationWindow::new(*duration)));
            }
        }
        set
    }

    pub fn get(&self, duration: Duration) -> Option<Arc<AggregationWindow>> {
        self.windows.iter().find(|w| w.duration() == duration).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AggregationWindow>> {
        self.windows.iter()
    }

    /// Increment every window once
    pub fn record(&self) {
        for window in &self.windows {
            window.increment();
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    #[test]
    fn test_drain_twice_yields_count_then_zero() {
        let window = AggregationWindow::new(Duration::from_secs(10));
        for _ in 0..5 {
            window.increment();
        }
        assert_eq!(window.drain_and_reset(), 5);
        assert_eq!(window.drain_and_reset(), 0);
        assert_eq!(window.peek(), 0);
    }

    #[test]
    fn test_first_drain_counts_since_construction() {
        let window = AggregationWindow::new(Duration::from_secs(60));
        assert_eq!(window.drain_and_reset(), 0);
        window.increment();
        assert_eq!(window.drain_and_reset(), 1);
    }

    #[test]
    fn test_windows_are_independent() {
        let set = WindowSet::from_durations(&[Duration::from_secs(10), Duration::from_secs(60)]);
        let short = set.get(Duration::from_secs(10)).unwrap();
        let long = set.get(Duration::from_secs(60)).unwrap();

        short.increment();
        short.increment();
        assert_eq!(long.peek(), 0);

        long.increment();
        assert_eq!(short.drain_and_reset(), 2);
        assert_eq!(long.peek(), 1);
        assert_eq!(long.drain_and_reset(), 1);
    }

    #[test]
    fn test_record_hits_every_window() {
        let set = WindowSet::from_durations(&[Duration::from_secs(10), Duration::from_secs(60)]);
        for _ in 0..7 {
            set.record();
        }
        let counts: Vec<u64> = set.iter().map(|w| w.drain_and_reset()).collect();
        assert_eq!(counts, vec![7, 7]);
    }

    #[test]
    fn test_duplicate_durations_collapse() {
        let set = WindowSet::from_durations(&[
            Duration::from_secs(10),
            Duration::from_secs(60),
            Duration::from_secs(10),
        ]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_sub_second_durations_rejected() {
        let set = WindowSet::from_durations(&[
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_secs(10),
        ]);
        assert_eq!(set.len(), 1);
        assert!(set.get(Duration::ZERO).is_none());
        assert!(set.get(Duration::from_millis(500)).is_none());
        let names: Vec<String> = set.iter().map(|w| w.metric_name()).collect();
        assert_eq!(names, vec!["tx_count_last_10s".to_string()]);

        assert!(WindowSet::from_durations(&[Duration::ZERO]).is_empty());
    }

    #[test]
    fn test_metric_name() {
        let window = AggregationWindow::new(Duration::from_secs(60));
        assert_eq!(window.metric_name(), "tx_count_last_60s");
    }

    #[test]
    fn test_concurrent_increments_and_drains_conserve_count() {
        // 4 producers race a draining thread; total drained must equal total produced
        let window = Arc::new(AggregationWindow::new(Duration::from_secs(10)));
        let done = Arc::new(AtomicBool::new(false));
        let per_thread = 10_000u64;

        let drainer = {
            let window = window.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut drained = 0u64;
                while !done.load(Ordering::Acquire) {
                    drained += window.drain_and_reset();
                    thread::yield_now();
                }
                drained
            })
        };

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let window = window.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        window.increment();
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        done.store(true, Ordering::Release);

        let drained = drainer.join().unwrap() + window.drain_and_reset();
        assert_eq!(drained, 4 * per_thread);
    }

    #[test]
    fn test_concurrent_drains_never_double_count() {
        let window = Arc::new(AggregationWindow::new(Duration::from_secs(10)));
        for _ in 0..50_000 {
            window.increment();
        }

        let drainers: Vec<_> = (0..4)
            .map(|_| {
                let window = window.clone();
                thread::spawn(move || window.drain_and_reset())
            })
            .collect();

        let total: u64 = drainers.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 50_000);
    }
}
