//! Dash node notification monitor.
//!
//! Subscribes to the node's pub/sub notifier, appends structural events
//! (blocks, governance objects and votes) to an audit log, and counts
//! transaction hashes in fixed windows reported to a metrics sink.

pub mod config;
pub mod pipeline;
pub mod shutdown;
pub mod streamer_core;
