//! Ingestion loop: subscription -> frame decoder -> topic router
//!
//! Frames are handled one at a time; the next frame is not pulled until the
//! current one has been routed. Malformed frames are skipped and counted.

use crate::shutdown::{self, ShutdownReceiver};
use crate::streamer_core::frame::decode_frame;
use crate::streamer_core::router::{Dispatched, TopicRouter};
use crate::streamer_core::subscription::{Subscription, SubscriptionError};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    Connecting,
    Subscribed,
    Receiving,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionStats {
    pub frames: u64,
    pub counted: u64,
    pub audited: u64,
    pub audit_failures: u64,
    pub informational: u64,
    /// Malformed frames dropped by the decoder
    pub skipped: u64,
}

#[derive(Debug)]
pub enum IngestionError {
    /// Subscription broken or unreachable; fatal to the loop
    Transport(SubscriptionError),
    /// Ingestion task panicked or was cancelled
    Aborted(String),
}

impl From<SubscriptionError> for IngestionError {
    fn from(err: SubscriptionError) -> Self {
        IngestionError::Transport(err)
    }
}

impl std::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionError::Transport(e) => write!(f, "Transport failure: {}", e),
            IngestionError::Aborted(msg) => write!(f, "Ingestion aborted: {}", msg),
        }
    }
}

impl std::error::Error for IngestionError {}

pub struct IngestionLoop {
    router: TopicRouter,
    state: IngestionState,
    stats: IngestionStats,
}

impl IngestionLoop {
    pub fn new(router: TopicRouter) -> Self {
        Self {
            router,
            state: IngestionState::Connecting,
            stats: IngestionStats::default(),
        }
    }

    pub fn state(&self) -> IngestionState {
        self.state
    }

    pub fn stats(&self) -> &IngestionStats {
        &self.stats
    }

    fn transition(&mut self, next: IngestionState) {
        log::info!("🔄 Ingestion: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Establish the subscription via `connect`, then receive until shutdown,
    /// end-of-stream, or transport failure.
    pub async fn connect_and_run<S, F, Fut>(
        &mut self,
        connect: F,
        mut shutdown: ShutdownReceiver,
    ) -> Result<IngestionStats, IngestionError>
    where
        S: Subscription,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S, SubscriptionError>>,
    {
        self.state = IngestionState::Connecting;

        let connected = tokio::select! {
            biased;
            _ = shutdown::requested(&mut shutdown) => None,
            result = connect() => Some(result),
        };

        match connected {
            Some(Ok(subscription)) => self.run(subscription, shutdown).await,
            Some(Err(e)) => {
                log::error!("❌ Could not establish subscription: {}", e);
                self.transition(IngestionState::Stopping);
                self.router.flush().await;
                self.transition(IngestionState::Stopped);
                Err(e.into())
            }
            None => {
                log::info!("Shutdown requested while connecting");
                self.transition(IngestionState::Stopping);
                self.transition(IngestionState::Stopped);
                Ok(self.stats.clone())
            }
        }
    }

    /// Receive from an established subscription. The subscription is closed
    /// on every exit path.
    pub async fn run<S: Subscription>(
        &mut self,
        mut subscription: S,
        mut shutdown: ShutdownReceiver,
    ) -> Result<IngestionStats, IngestionError> {
        self.transition(IngestionState::Subscribed);
        log::info!("📡 Subscribed via {}", subscription.describe());
        self.transition(IngestionState::Receiving);

        let outcome = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown::requested(&mut shutdown) => {
                    log::info!("⚠️  Shutdown requested, stopping ingestion");
                    break Ok(());
                }
                next = subscription.next_frame() => next,
            };

            match next {
                Ok(Some(frame)) => {
                    self.stats.frames += 1;
                    self.handle_frame(&frame).await;
                }
                Ok(None) => {
                    log::warn!("⚠️  Subscription ended, stopping ingestion");
                    break Ok(());
                }
                Err(e) => {
                    log::error!("❌ Subscription failed: {}", e);
                    break Err(IngestionError::Transport(e));
                }
            }
        };

        self.transition(IngestionState::Stopping);
        subscription.close().await;
        self.router.flush().await;
        self.transition(IngestionState::Stopped);

        log::info!(
            "✅ Ingestion stopped: {} frames ({} counted, {} audited, {} audit failures, {} informational, {} skipped)",
            self.stats.frames,
            self.stats.counted,
            self.stats.audited,
            self.stats.audit_failures,
            self.stats.informational,
            self.stats.skipped
        );

        outcome.map(|()| self.stats.clone())
    }

    async fn handle_frame(&mut self, frame: &[Vec<u8>]) {
        let event = match decode_frame(frame) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("⚠️  Skipping malformed frame: {}", e);
                self.stats.skipped += 1;
                return;
            }
        };

        match self.router.dispatch(&event).await {
            Dispatched::Counted => self.stats.counted += 1,
            Dispatched::Audited => self.stats.audited += 1,
            Dispatched::AuditFailed => self.stats.audit_failures += 1,
            Dispatched::Informed => self.stats.informational += 1,
        }
    }
}

/// Run one ingestion loop over an established subscription
pub async fn run_ingestion<S: Subscription>(
    subscription: S,
    router: TopicRouter,
    shutdown: ShutdownReceiver,
) -> Result<IngestionStats, IngestionError> {
    IngestionLoop::new(router).run(subscription, shutdown).await
}
