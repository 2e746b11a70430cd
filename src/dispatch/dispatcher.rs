//! # The dispatch loop.
//!
//! ## Flow per sensor entity
//! ```text
//! sensor arrives
//!   ├─ not registered ──► Delivery::register
//!   │                       ├─ accepted ──► Registry::set_registered(true)
//!   │                       └─ declined/error ──► warn (retried on next
//!   │                                             appearance of the ID)
//!   └─ registered ──► reconcile enablement:
//!         (local, remote) = (Registry::is_disabled, Delivery::entity_disabled)
//!         ├─ (false, false) ──► deliver update
//!         ├─ (true,  true ) ──► skip, no remote call
//!         ├─ (false, true ) ──► set_disabled(true), skip
//!         ├─ (true,  false) ──► set_disabled(false), deliver update
//!         └─ remote fetch error ──► treat as not disabled, deliver
//!                                   (fail open, registry untouched)
//! ```
//!
//! After reconciliation the local disabled flag always equals the last
//! known remote value, and delivery happens iff the post-reconciliation
//! flag is false.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::dispatch::delivery::Delivery;
use crate::models::{Entity, SensorUpdate};
use crate::registry::Registry;

/// # Consumes the merged producer stream and drives remote delivery.
pub struct Dispatcher {
    registry: Arc<Registry>,
    delivery: Arc<dyn Delivery>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry and delivery
    /// collaborator.
    pub fn new(registry: Arc<Registry>, delivery: Arc<dyn Delivery>) -> Self {
        Self { registry, delivery }
    }

    /// Drains `entities` until the stream closes or `token` is cancelled.
    ///
    /// This is the single consuming task for the merged stream: dispatch is
    /// serialized, so registry operations for a given ID are totally
    /// ordered. Every delivery failure is absorbed into a log line; one
    /// entity's failure never blocks the next.
    pub async fn run(&self, token: CancellationToken, mut entities: mpsc::Receiver<Entity>) {
        loop {
            let entity = tokio::select! {
                _ = token.cancelled() => break,
                received = entities.recv() => match received {
                    Some(entity) => entity,
                    None => break,
                },
            };

            if !entity.is_valid() {
                warn!(kind = entity.kind(), "dropping structurally invalid entity");
                continue;
            }

            match entity {
                Entity::Event(event) => {
                    if let Err(err) = self.delivery.send_event(&event).await {
                        warn!(event_type = %event.event_type, error = %err, "could not send event");
                    }
                }
                Entity::Location(location) => {
                    if let Err(err) = self.delivery.send_location(&location).await {
                        warn!(error = %err, "could not update location");
                    }
                }
                Entity::Sensor(sensor) => self.process_sensor(&sensor).await,
            }
        }

        debug!("dispatch loop finished");
    }

    async fn process_sensor(&self, sensor: &SensorUpdate) {
        let id = sensor.unique_id.as_str();

        if !self.registry.is_registered(id) {
            self.register_sensor(sensor).await;
            return;
        }

        if self.sensor_disabled(id).await {
            trace!(id, "sensor disabled, not sending update");
            return;
        }

        if let Err(err) = self.delivery.update(sensor).await {
            warn!(id, name = %sensor.name, error = %err, "could not update sensor");
            return;
        }

        trace!(id, "sensor updated");
    }

    async fn register_sensor(&self, sensor: &SensorUpdate) {
        let id = sensor.unique_id.as_str();

        match self.delivery.register(sensor).await {
            Ok(true) => {
                if let Err(err) = self.registry.set_registered(id, true) {
                    warn!(id, error = %err, "could not set local registration status");
                    return;
                }
                debug!(id, name = %sensor.name, "sensor registered");
            }
            Ok(false) => {
                warn!(id, name = %sensor.name, "sensor not registered");
            }
            Err(err) => {
                warn!(id, name = %sensor.name, error = %err, "sensor registration failed");
            }
        }
    }

    /// Reconciles the local disabled flag against the remote-reported one
    /// and returns whether delivery should be skipped.
    ///
    /// An indeterminate remote state (fetch error) is treated as "not
    /// disabled": failing open avoids silently dropping telemetry, and the
    /// local flag is left untouched until the remote answers again.
    async fn sensor_disabled(&self, id: &str) -> bool {
        let local = self.registry.is_disabled(id);

        let remote = match self.delivery.entity_disabled(id).await {
            Ok(remote) => remote,
            Err(err) => {
                trace!(id, error = %err, "remote disabled state indeterminate, failing open");
                return false;
            }
        };

        match (local, remote) {
            (false, false) => false,
            (true, true) => {
                debug!(id, "sensor is disabled, not sending updates");
                true
            }
            (false, true) => {
                debug!(id, "sensor disabled remotely, disabling in local registry");
                if let Err(err) = self.registry.set_disabled(id, true) {
                    warn!(id, error = %err, "could not update sensor state in registry");
                }
                true
            }
            (true, false) => {
                debug!(id, "sensor re-enabled remotely, re-enabling in local registry");
                if let Err(err) = self.registry.set_disabled(id, false) {
                    warn!(id, error = %err, "could not update sensor state in registry");
                }
                false
            }
        }
    }
}
