use crate::streamer_core::frame::Frame;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum SubscriptionError {
    Connection(String),
    Receive(String),
    MaxRetries,
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionError::Connection(msg) => write!(f, "Connection error: {}", msg),
            SubscriptionError::Receive(msg) => write!(f, "Receive error: {}", msg),
            SubscriptionError::MaxRetries => write!(f, "Maximum retry attempts exceeded"),
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl From<crate::streamer_core::error_handler::MaxRetriesExceeded> for SubscriptionError {
    fn from(_: crate::streamer_core::error_handler::MaxRetriesExceeded) -> Self {
        SubscriptionError::MaxRetries
    }
}

/// Source of raw pub/sub frames.
///
/// `next_frame` suspends until a frame arrives; `Ok(None)` is end-of-stream.
/// The topic filter is fixed when the subscription is created.
#[async_trait]
pub trait Subscription: Send {
    async fn next_frame(&mut self) -> Result<Option<Frame>, SubscriptionError>;

    /// Release the underlying transport
    async fn close(&mut self);

    /// Endpoint description for logging
    fn describe(&self) -> String;
}

/// In-memory subscription fed through an mpsc channel (tests, replay)
pub struct ChannelSubscription {
    rx: mpsc::Receiver<Result<Frame, SubscriptionError>>,
    closed: bool,
}

impl ChannelSubscription {
    /// Returns the subscription and the sender that feeds it
    pub fn new(buffer: usize) -> (mpsc::Sender<Result<Frame, SubscriptionError>>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx, closed: false })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl Subscription for ChannelSubscription {
    async fn next_frame(&mut self) -> Result<Option<Frame>, SubscriptionError> {
        match self.rx.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        self.rx.close();
        self.closed = true;
    }

    fn describe(&self) -> String {
        "in-memory channel".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_subscription_yields_frames_then_end() {
        let (tx, mut sub) = ChannelSubscription::new(4);
        tx.send(Ok(vec![b"hashtx".to_vec(), vec![1]])).await.unwrap();
        drop(tx);

        let frame = sub.next_frame().await.unwrap().unwrap();
        assert_eq!(frame[0], b"hashtx".to_vec());
        assert!(sub.next_frame().await.unwrap().is_none());

        sub.close().await;
        assert!(sub.is_closed());
    }

    #[tokio::test]
    async fn test_channel_subscription_surfaces_transport_error() {
        let (tx, mut sub) = ChannelSubscription::new(4);
        tx.send(Err(SubscriptionError::Receive("socket reset".to_string())))
            .await
            .unwrap();

        let err = sub.next_frame().await.unwrap_err();
        assert_eq!(err.to_string(), "Receive error: socket reset");
    }
}
