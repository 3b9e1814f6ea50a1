//! InitialState events API sink
//!
//! ## API Reference
//!
//! Endpoint: `POST https://groker.initialstate.com/api/events`
//! Headers: `X-IS-AccessKey`, `X-IS-BucketKey`, `Accept-Version: ~0`
//! Body: JSON array of `{ "key", "value", "epoch" }`

use crate::pipeline::reporter::{MetricsSink, SinkError};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_EVENTS_URL: &str = "https://groker.initialstate.com/api/events";

/// One event in the request body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StreamEvent {
    pub key: String,
    pub value: f64,
    /// Seconds since the unix epoch
    pub epoch: f64,
}

pub struct InitialStateSink {
    client: reqwest::Client,
    url: String,
    access_key: String,
    bucket_key: String,
}

impl InitialStateSink {
    pub fn new(access_key: String, bucket_key: String) -> Result<Self, SinkError> {
        Self::with_url(DEFAULT_EVENTS_URL.to_string(), access_key, bucket_key)
    }

    pub fn with_url(url: String, access_key: String, bucket_key: String) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SinkError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url,
            access_key,
            bucket_key,
        })
    }
}

/// Request body for one report, sorted by key for stable output
pub fn build_events(values: &HashMap<String, f64>, epoch: f64) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = values
        .iter()
        .map(|(key, value)| StreamEvent {
            key: key.clone(),
            value: *value,
            epoch,
        })
        .collect();
    events.sort_by(|a, b| a.key.cmp(&b.key));
    events
}

#[async_trait]
impl MetricsSink for InitialStateSink {
    async fn report(&self, values: &HashMap<String, f64>) -> Result<(), SinkError> {
        let epoch = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        let events = build_events(values, epoch);

        let response = self
            .client
            .post(&self.url)
            .header("X-IS-AccessKey", &self.access_key)
            .header("X-IS-BucketKey", &self.bucket_key)
            .header("Accept-Version", "~0")
            .json(&events)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status().as_u16()));
        }

        Ok(())
    }

    fn sink_type(&self) -> &'static str {
        "InitialState"
    }
}
