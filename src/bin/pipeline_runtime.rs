//! Pipeline Runtime
//!
//! Subscribes to the node's ZMQ notifier and runs the full pipeline:
//! - Structural events (blocks, governance objects/votes) -> audit log
//! - `hashtx` events -> 10s / 60s aggregation windows -> metrics sink
//!
//! Usage:
//!   cargo run --release --features zmq --bin pipeline_runtime
//!
//! Environment variables:
//!   ZMQ_ENDPOINT - Notifier endpoint (default: tcp://127.0.0.1:28332)
//!   ZMQ_TOPICS - Comma-separated topics (default: all node topics)
//!   WINDOW_DURATIONS_SECS - Window durations (default: 10,60)
//!   AUDIT_BACKEND / AUDIT_LOG_PATH - csv|sqlite (default: csv, messages.csv)
//!   INITIALSTATE_ACCESS_KEY / INITIALSTATE_BUCKET_KEY - Metrics sink credentials

use dashflow::config::RuntimeConfig;
use dashflow::pipeline::{
    InitialStateSink, LogSink, MetricsSink, PipelineConfig, PipelineEngine,
};
use dashflow::streamer_core::writer_backend::open_audit_log;
use dashflow::streamer_core::ZmqSubscription;
use dotenv::dotenv;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let runtime_config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&runtime_config.rust_log))
        .target(env_logger::Target::Stderr)
        .init();

    for warning in runtime_config.topic_warnings() {
        warn!("⚠️  {}", warning);
    }

    match run(runtime_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ Pipeline runtime failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(runtime_config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline_config = PipelineConfig::from_env();

    info!("🚀 Starting dashflow pipeline runtime");
    info!("   ├─ Endpoint: {}", runtime_config.zmq_endpoint);
    info!("   ├─ Topics: {}", runtime_config.zmq_topics.join(", "));
    info!(
        "   ├─ Windows: {:?}",
        pipeline_config
            .window_durations
            .iter()
            .map(|d| d.as_secs())
            .collect::<Vec<_>>()
    );
    info!("   └─ Audit log: {}", runtime_config.audit_log_path);

    let audit_log = open_audit_log(&runtime_config.audit_backend, &runtime_config.audit_log_path)?;

    let sink: Arc<dyn MetricsSink> = match &runtime_config.initialstate {
        Some(creds) => {
            info!("📈 Reporting to InitialState bucket '{}'", creds.bucket_name);
            Arc::new(InitialStateSink::new(
                creds.access_key.clone(),
                creds.bucket_key.clone(),
            )?)
        }
        None => {
            info!("📈 No InitialState credentials, reporting to log only");
            Arc::new(LogSink)
        }
    };

    let engine = PipelineEngine::new(&pipeline_config, audit_log, sink);

    info!("🚀 Spawning tasks...");
    let connect_config = runtime_config.clone();
    let running = engine.start(move || async move { ZmqSubscription::connect(&connect_config).await });

    info!("🔄 Press CTRL+C to shutdown gracefully");

    let stats = running
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
                Err(err) => {
                    error!("❌ Failed to listen for CTRL+C: {}", err);
                    std::future::pending::<()>().await
                }
            }
        })
        .await?;

    info!(
        "✅ Pipeline runtime stopped ({} frames, {} tx counted, {} audited)",
        stats.frames, stats.counted, stats.audited
    );
    Ok(())
}
