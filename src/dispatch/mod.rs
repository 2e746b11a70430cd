//! # Dispatch and reconciliation.
//!
//! The dispatcher drains the merged producer stream, classifies each
//! [`Entity`](crate::models::Entity) and drives the correct remote-delivery
//! path, keeping the local [`Registry`](crate::registry::Registry)
//! consistent with remote-reported state.
//!
//! Per-sensor state machine: `Unknown → RegistrationPending → Registered`.
//! Events and locations bypass the registry entirely and are delivered
//! directly.
//!
//! A single consuming task drains the stream, so registry reads and writes
//! for the same ID never race with themselves; remote calls block that
//! task, which is an accepted trade-off at expected entity volumes.

mod delivery;
mod dispatcher;

pub use delivery::Delivery;
pub use dispatcher::Dispatcher;
