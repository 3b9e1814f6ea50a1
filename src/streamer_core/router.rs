//! Topic dispatch: audit, count, or log-only.

use crate::pipeline::windows::WindowSet;
use crate::streamer_core::frame::{Event, Topic};
use crate::streamer_core::writer_backend::{AuditLog, AuditRecord};

/// Handling path for a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Append to the audit log
    Audit,
    /// Increment every aggregation window
    Count,
    /// Log only
    Inform,
}

/// Dispatch table. Exhaustive over `Topic`, so a new topic cannot compile
/// without a route.
pub fn route_for(topic: &Topic) -> Route {
    match topic {
        Topic::BlockHash
        | Topic::RawBlock
        | Topic::GovernanceObject
        | Topic::GovernanceVote
        | Topic::GovernanceObjectHash
        | Topic::GovernanceVoteHash => Route::Audit,
        Topic::TxHash => Route::Count,
        Topic::TxHashLock | Topic::RawTx | Topic::RawTxLock | Topic::Other(_) => Route::Inform,
    }
}

/// What happened to one routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Audited,
    /// Audit append failed; logged and dropped
    AuditFailed,
    Counted,
    Informed,
}

pub struct TopicRouter {
    audit_log: Box<dyn AuditLog>,
    windows: WindowSet,
}

impl TopicRouter {
    pub fn new(audit_log: Box<dyn AuditLog>, windows: WindowSet) -> Self {
        Self { audit_log, windows }
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Route one event. Never fails: audit errors are logged and reported
    /// through the returned outcome.
    pub async fn dispatch(&mut self, event: &Event) -> Dispatched {
        match route_for(&event.topic) {
            Route::Audit => {
                let record = AuditRecord {
                    timestamp: now_seconds(),
                    topic: event.topic.as_str().to_string(),
                    value: event.payload_hex(),
                    sequence: event.sequence.to_string(),
                };

                log::info!("- {} ({}) - {}", event.topic.label(), record.sequence, record.value);

                match self.audit_log.append(&record).await {
                    Ok(()) => Dispatched::Audited,
                    Err(e) => {
                        log::warn!(
                            "⚠️  Audit append failed ({}, seq {}): {}",
                            record.topic,
                            record.sequence,
                            e
                        );
                        Dispatched::AuditFailed
                    }
                }
            }
            Route::Count => {
                log::debug!(
                    "- {} ({}) - {}",
                    event.topic.label(),
                    event.sequence,
                    event.payload_hex()
                );
                self.windows.record();
                Dispatched::Counted
            }
            Route::Inform => {
                if let Topic::Other(name) = &event.topic {
                    log::debug!("Ignoring unrecognized topic '{}' ({})", name, event.sequence);
                } else {
                    log::debug!(
                        "- {} ({}) - {}",
                        event.topic.label(),
                        event.sequence,
                        event.payload_hex()
                    );
                }
                Dispatched::Informed
            }
        }
    }

    /// Flush the audit backend; called when ingestion stops
    pub async fn flush(&mut self) {
        if let Err(e) = self.audit_log.flush().await {
            log::warn!("⚠️  Audit log flush failed: {}", e);
        }
    }

    pub fn audit_backend(&self) -> &'static str {
        self.audit_log.backend_type()
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
