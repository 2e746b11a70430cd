//! Telemetry entity model.
//!
//! An [`Entity`] is an immutable value object created by a producer and
//! consumed exactly once by the dispatcher. Validity is structural and is
//! checked before any network use.

mod entity;

pub use entity::{Entity, EntityCategory, EventData, LocationUpdate, SensorUpdate};
