use crate::config::RuntimeConfig;
use crate::streamer_core::error_handler::ExponentialBackoff;
use crate::streamer_core::frame::Frame;
use crate::streamer_core::subscription::{Subscription, SubscriptionError};
use async_trait::async_trait;
use zeromq::{Socket, SocketRecv, SubSocket};

/// SUB socket on the node's notifier endpoint
pub struct ZmqSubscription {
    socket: Option<SubSocket>,
    endpoint: String,
    topics: Vec<String>,
}

impl ZmqSubscription {
    /// Connect and subscribe, retrying with exponential backoff (1s..30s, 10 attempts)
    pub async fn connect(config: &RuntimeConfig) -> Result<Self, SubscriptionError> {
        let mut backoff = ExponentialBackoff::new(1, 30, 10);

        loop {
            match Self::try_connect(&config.zmq_endpoint, &config.zmq_topics).await {
                Ok(sub) => {
                    log::info!("✅ Connected to {}", config.zmq_endpoint);
                    return Ok(sub);
                }
                Err(e) => {
                    log::error!("❌ Connection failed: {}", e);
                    backoff.sleep().await?;
                }
            }
        }
    }

    async fn try_connect(endpoint: &str, topics: &[String]) -> Result<Self, SubscriptionError> {
        let mut socket = SubSocket::new();
        socket
            .connect(endpoint)
            .await
            .map_err(|e| SubscriptionError::Connection(format!("{}: {}", endpoint, e)))?;

        for topic in topics {
            socket
                .subscribe(topic)
                .await
                .map_err(|e| SubscriptionError::Connection(format!("subscribe {}: {}", topic, e)))?;
            log::info!("   ├─ Subscribed: {}", topic);
        }

        Ok(Self {
            socket: Some(socket),
            endpoint: endpoint.to_string(),
            topics: topics.to_vec(),
        })
    }
}

#[async_trait]
impl Subscription for ZmqSubscription {
    async fn next_frame(&mut self) -> Result<Option<Frame>, SubscriptionError> {
        let socket = match self.socket.as_mut() {
            Some(socket) => socket,
            None => return Ok(None),
        };

        let message = socket
            .recv()
            .await
            .map_err(|e| SubscriptionError::Receive(e.to_string()))?;

        Ok(Some(message.into_vec().into_iter().map(|part| part.to_vec()).collect()))
    }

    async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            for e in socket.close().await {
                log::warn!("⚠️  Error closing socket {}: {}", self.endpoint, e);
            }
            log::info!("🔌 Closed subscription to {}", self.endpoint);
        }
    }

    fn describe(&self) -> String {
        format!("zmq {} [{}]", self.endpoint, self.topics.join(", "))
    }
}
