//! # Remote delivery collaborator contract.
//!
//! The concrete transport (REST, WebSocket, ...) lives outside this crate;
//! the dispatcher only needs the abstract request/response contract below.
//! Every error is non-fatal to the dispatch loop — retry is "the next time
//! this work item appears", there is no explicit retry queue.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::models::{EventData, LocationUpdate, SensorUpdate};

/// # The remote consumer of telemetry.
///
/// Implementations carry their own timeouts; the dispatcher imposes none
/// beyond honoring cancellation.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Registers a sensor with the remote side.
    ///
    /// `Ok(true)` means the registration was accepted; `Ok(false)` means
    /// the remote declined it without a transport error.
    async fn register(&self, sensor: &SensorUpdate) -> Result<bool, DeliveryError>;

    /// Sends a state update for an already-registered sensor.
    async fn update(&self, sensor: &SensorUpdate) -> Result<(), DeliveryError>;

    /// Fetches the remote-reported disabled flag for a sensor ID.
    async fn entity_disabled(&self, id: &str) -> Result<bool, DeliveryError>;

    /// Delivers a free-form event.
    async fn send_event(&self, event: &EventData) -> Result<(), DeliveryError>;

    /// Delivers a location update.
    async fn send_location(&self, location: &LocationUpdate) -> Result<(), DeliveryError>;
}
