//! # Producer contracts.
//!
//! The manager depends on exactly two minimal capabilities, never on
//! concrete producer types:
//!
//! - [`EntityWorker`] — produces a stream of telemetry [`Entity`] values.
//! - [`PubSubWorker`] — contributes static configuration descriptors and
//!   subscriptions to the pub/sub side, plus a stream of outbound messages.
//!
//! Both must close their output stream exactly once, after their token is
//! cancelled, and must not send after closing.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::models::Entity;

/// # A producer of telemetry entities.
#[async_trait]
pub trait EntityWorker: Send + Sync {
    /// Stable worker ID, unique across all producers.
    fn id(&self) -> &str;

    /// Starts the producer under `token` and returns its output stream.
    ///
    /// The stream closes after `token` is cancelled. A start failure means
    /// the producer contributes nothing; the manager logs and moves on.
    async fn start(&self, token: CancellationToken) -> Result<mpsc::Receiver<Entity>, WorkerError>;
}

/// Static configuration descriptor announced on the pub/sub bus.
#[derive(Clone, Debug, PartialEq)]
pub struct PubSubConfig {
    /// Topic the descriptor is published under.
    pub topic: String,
    /// Descriptor payload.
    pub payload: Value,
    /// Whether the broker should retain the descriptor.
    pub retain: bool,
}

/// A topic subscription requested by a pub/sub producer.
#[derive(Clone, Debug, PartialEq)]
pub struct PubSubSubscription {
    /// Topic filter to subscribe to.
    pub topic: String,
}

/// One outbound pub/sub message.
#[derive(Clone, Debug, PartialEq)]
pub struct PubSubMessage {
    /// Destination topic.
    pub topic: String,
    /// Message payload.
    pub payload: Value,
    /// Whether the broker should retain the message.
    pub retain: bool,
}

/// Everything a pub/sub producer hands back from `start`.
pub struct PubSubBundle {
    /// Static configuration descriptors to announce once.
    pub configs: Vec<PubSubConfig>,
    /// Topic subscriptions to establish.
    pub subscriptions: Vec<PubSubSubscription>,
    /// Stream of outbound messages.
    pub messages: mpsc::Receiver<PubSubMessage>,
}

/// # A producer on the pub/sub side.
#[async_trait]
pub trait PubSubWorker: Send + Sync {
    /// Stable worker ID, unique across all producers.
    fn id(&self) -> &str;

    /// Starts the producer under `token` and returns its bundle of
    /// configuration, subscriptions and outbound messages.
    async fn start(&self, token: CancellationToken) -> Result<PubSubBundle, WorkerError>;
}
