//! Window schedulers
//!
//! One task per aggregation window. Each tick drains the window and reports
//! the count, including zero for quiet periods. Reporting failures are logged
//! by the reporter; the scheduler keeps ticking regardless.

use super::reporter::MetricsReporter;
use super::windows::AggregationWindow;
use crate::shutdown::{self, ShutdownReceiver};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Drain `window` every `window.duration()` until shutdown.
///
/// The first tick fires one full period after start. Returns the number of
/// ticks performed. Content accumulated since the last tick is not flushed
/// on shutdown.
pub async fn window_scheduler_task(
    window: Arc<AggregationWindow>,
    reporter: MetricsReporter,
    mut shutdown: ShutdownReceiver,
) -> u64 {
    let period = window.duration();
    let metric = window.metric_name();
    log::info!("⏰ Starting window scheduler: {} (interval: {}s)", metric, period.as_secs());

    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = shutdown::requested(&mut shutdown) => break,
            _ = timer.tick() => {
                let count = window.drain_and_reset();
                ticks += 1;
                if !reporter.report(&metric, count).await {
                    log::debug!("{} tick {} not delivered (count {} dropped)", metric, ticks, count);
                }
            }
        }
    }

    log::info!("⏹️  Window scheduler {} stopped after {} ticks", metric, ticks);
    ticks
}

/// Spawn one scheduler per window
pub fn spawn_window_schedulers<'a>(
    windows: impl IntoIterator<Item = &'a Arc<AggregationWindow>>,
    reporter: &MetricsReporter,
    shutdown: &ShutdownReceiver,
) -> Vec<JoinHandle<u64>> {
    windows
        .into_iter()
        .map(|window| {
            tokio::spawn(window_scheduler_task(
                window.clone(),
                reporter.clone(),
                shutdown.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reporter::test_support::RecordingSink;
    use std::time::Duration;

    fn window(secs: u64) -> Arc<AggregationWindow> {
        Arc::new(AggregationWindow::new(Duration::from_secs(secs)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_drains_and_reports() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = MetricsReporter::new(sink.clone());
        let (shutdown_tx, shutdown_rx) = shutdown::channel();
        let short = window(10);

        let handle = tokio::spawn(window_scheduler_task(short.clone(), reporter, shutdown_rx));

        for _ in 0..3 {
            short.increment();
        }
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(sink.values_for("tx_count_last_10s"), vec![3.0]);
        assert_eq!(short.peek(), 0);

        // Quiet period still reports zero
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(sink.values_for("tx_count_last_10s"), vec![3.0, 0.0]);

        shutdown_tx.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_report_before_first_period() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = MetricsReporter::new(sink.clone());
        let (shutdown_tx, shutdown_rx) = shutdown::channel();

        let handle = tokio::spawn(window_scheduler_task(window(60), reporter, shutdown_rx));
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(sink.reports.lock().unwrap().is_empty());

        shutdown_tx.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_ticking_when_sink_fails() {
        let sink = Arc::new(RecordingSink::failing());
        let reporter = MetricsReporter::new(sink.clone());
        let (shutdown_tx, shutdown_rx) = shutdown::channel();
        let short = window(10);

        let handle = tokio::spawn(window_scheduler_task(short.clone(), reporter, shutdown_rx));

        short.increment();
        tokio::time::sleep(Duration::from_millis(30_500)).await;

        // Failed counts are not carried forward
        assert_eq!(sink.values_for("tx_count_last_10s"), vec![1.0, 0.0, 0.0]);

        shutdown_tx.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_drain_on_own_schedule() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = MetricsReporter::new(sink.clone());
        let (shutdown_tx, shutdown_rx) = shutdown::channel();
        let short = window(10);
        let long = window(60);

        let handles = spawn_window_schedulers([&short, &long], &reporter, &shutdown_rx);

        for _ in 0..7 {
            short.increment();
            long.increment();
        }

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(sink.values_for("tx_count_last_10s"), vec![7.0]);
        assert!(sink.values_for("tx_count_last_60s").is_empty());
        assert_eq!(long.peek(), 7);

        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(sink.values_for("tx_count_last_60s"), vec![7.0]);
        assert_eq!(sink.values_for("tx_count_last_10s"), vec![7.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        shutdown_tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
