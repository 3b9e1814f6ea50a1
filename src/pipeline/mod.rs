//! # Windowed tx-volume aggregation
//!
//! Every `hashtx` event increments each configured window (default 10s and
//! 60s). A scheduler per window drains it on its own period and reports the
//! drained count to the metrics sink as `tx_count_last_{N}s`.
//!
//! ## Module Organization
//!
//! - `windows` - Atomic counting windows and the configured set
//! - `scheduler` - Periodic drain-and-report tasks
//! - `reporter` - Metrics sink trait and the reporting adapter
//! - `initialstate` - InitialState HTTP sink
//! - `engine` - Task wiring and shutdown
//! - `config` - Window durations from the environment

pub mod config;
pub mod engine;
pub mod initialstate;
pub mod reporter;
pub mod scheduler;
pub mod windows;

pub use config::PipelineConfig;
pub use engine::{PipelineEngine, RunningPipeline};
pub use initialstate::InitialStateSink;
pub use reporter::{LogSink, MetricsReporter, MetricsSink, SinkError};
pub use scheduler::{spawn_window_schedulers, window_scheduler_task};
pub use windows::{AggregationWindow, WindowSet};
