//! Pipeline wiring: one ingestion task feeding N windows, one scheduler per window.

use super::config::PipelineConfig;
use super::reporter::{MetricsReporter, MetricsSink};
use super::scheduler::spawn_window_schedulers;
use super::windows::WindowSet;
use crate::shutdown::{self, ShutdownSender};
use crate::streamer_core::ingestion::{IngestionError, IngestionLoop, IngestionStats};
use crate::streamer_core::router::TopicRouter;
use crate::streamer_core::subscription::{Subscription, SubscriptionError};
use crate::streamer_core::writer_backend::AuditLog;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct PipelineEngine {
    windows: WindowSet,
    router: TopicRouter,
    reporter: MetricsReporter,
}

impl PipelineEngine {
    pub fn new(
        config: &PipelineConfig,
        audit_log: Box<dyn AuditLog>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let windows = WindowSet::from_durations(&config.window_durations);
        let router = TopicRouter::new(audit_log, windows.clone());
        Self {
            windows,
            router,
            reporter: MetricsReporter::new(sink),
        }
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Spawn the schedulers and the ingestion task. `connect` runs inside the
    /// ingestion task so shutdown can interrupt a slow connect.
    pub fn start<S, F, Fut>(self, connect: F) -> RunningPipeline
    where
        S: Subscription + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<S, SubscriptionError>> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = shutdown::channel();

        let schedulers = spawn_window_schedulers(self.windows.iter(), &self.reporter, &shutdown_rx);
        log::info!("   ├─ ✅ {} window scheduler(s) spawned", schedulers.len());

        let router = self.router;
        let ingestion = tokio::spawn(async move {
            IngestionLoop::new(router).connect_and_run(connect, shutdown_rx).await
        });
        log::info!("   └─ ✅ Ingestion task spawned");

        RunningPipeline {
            windows: self.windows,
            ingestion,
            schedulers,
            shutdown: shutdown_tx,
        }
    }
}

pub struct RunningPipeline {
    windows: WindowSet,
    ingestion: JoinHandle<Result<IngestionStats, IngestionError>>,
    schedulers: Vec<JoinHandle<u64>>,
    shutdown: ShutdownSender,
}

impl RunningPipeline {
    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Run until ingestion ends on its own or `stop` resolves, then stop the
    /// schedulers. Window contents since their last tick are discarded.
    pub async fn run_until(
        self,
        stop: impl Future<Output = ()>,
    ) -> Result<IngestionStats, IngestionError> {
        let RunningPipeline {
            mut ingestion,
            schedulers,
            shutdown,
            ..
        } = self;

        let joined = tokio::select! {
            res = &mut ingestion => res,
            _ = stop => {
                let _ = shutdown.send(true);
                ingestion.await
            }
        };

        let _ = shutdown.send(true);
        for scheduler in schedulers {
            if let Err(e) = scheduler.await {
                log::warn!("⚠️  Window scheduler ended abnormally: {}", e);
            }
        }

        match joined {
            Ok(outcome) => outcome,
            Err(e) => Err(IngestionError::Aborted(e.to_string())),
        }
    }
}
