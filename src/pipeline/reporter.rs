//! Metrics reporting boundary
//!
//! `MetricsReporter` adapts drained window counts into calls on an external
//! `MetricsSink`. Sink failures are logged and turned into `false`; nothing
//! propagates past the reporter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub enum SinkError {
    Http(String),
    Status(u16),
    Unavailable(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Http(msg) => write!(f, "HTTP error: {}", msg),
            SinkError::Status(code) => write!(f, "Metrics API error: status {}", code),
            SinkError::Unavailable(msg) => write!(f, "Sink unavailable: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// External metrics service
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn report(&self, values: &HashMap<String, f64>) -> Result<(), SinkError>;

    fn sink_type(&self) -> &'static str;
}

/// Sink that only logs; used when no metrics credentials are configured
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl MetricsSink for LogSink {
    async fn report(&self, values: &HashMap<String, f64>) -> Result<(), SinkError> {
        for (key, value) in values {
            log::info!("📈 {} = {}", key, value);
        }
        Ok(())
    }

    fn sink_type(&self) -> &'static str {
        "log"
    }
}

#[derive(Clone)]
pub struct MetricsReporter {
    sink: Arc<dyn MetricsSink>,
}

impl MetricsReporter {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self { sink }
    }

    /// Report one labeled count. Returns false on any sink failure.
    pub async fn report(&self, metric: &str, count: u64) -> bool {
        let mut values = HashMap::with_capacity(1);
        values.insert(metric.to_string(), count as f64);

        match self.sink.report(&values).await {
            Ok(()) => {
                log::info!("✅ Submitted {} = {} ({})", metric, count, self.sink.sink_type());
                true
            }
            Err(e) => {
                log::warn!("⚠️  Failed to submit {} = {}: {}", metric, count, e);
                false
            }
        }
    }
}
