//! # Entity types produced by workers.
//!
//! [`Entity`] is a tagged union of exactly one of [`SensorUpdate`],
//! [`EventData`] or [`LocationUpdate`]. Producers build entities with the
//! constructors below; the dispatcher classifies them and drives the
//! matching delivery path.
//!
//! ## Example
//! ```rust
//! use hostlink::{Entity, SensorUpdate};
//!
//! let sensor = SensorUpdate::new("battery_level", "Battery Level", 84.into())
//!     .with_unit("%")
//!     .with_device_class("battery");
//!
//! let entity = Entity::Sensor(sensor);
//! assert!(entity.is_valid());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a sensor is part of normal telemetry or diagnostic detail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Regular telemetry, shown alongside primary data.
    #[default]
    Normal,
    /// Diagnostic detail, typically hidden by default on the remote side.
    Diagnostic,
}

/// A single sensor reading together with its registration metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorUpdate {
    /// Unique ID of the sensor across all producers.
    pub unique_id: String,
    /// Human-readable sensor name.
    pub name: String,
    /// Current value.
    pub value: Value,
    /// Unit of measurement, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Device classification understood by the remote consumer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    /// State classification (measurement, total, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    /// Diagnostic vs normal category.
    #[serde(default)]
    pub category: EntityCategory,
    /// Whether a failed delivery of this sensor is worth retrying.
    #[serde(default)]
    pub retryable: bool,
}

impl SensorUpdate {
    /// Creates a sensor update with the required fields.
    pub fn new(unique_id: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self {
            unique_id: unique_id.into(),
            name: name.into(),
            value,
            unit: None,
            device_class: None,
            state_class: None,
            category: EntityCategory::Normal,
            retryable: false,
        }
    }

    /// Sets the unit of measurement.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the device classification.
    pub fn with_device_class(mut self, class: impl Into<String>) -> Self {
        self.device_class = Some(class.into());
        self
    }

    /// Sets the state classification.
    pub fn with_state_class(mut self, class: impl Into<String>) -> Self {
        self.state_class = Some(class.into());
        self
    }

    /// Marks the sensor as diagnostic.
    pub fn diagnostic(mut self) -> Self {
        self.category = EntityCategory::Diagnostic;
        self
    }

    /// Marks delivery of this sensor as retry-eligible.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// Structural validity: required fields present and non-empty.
    pub fn is_valid(&self) -> bool {
        !self.unique_id.is_empty() && !self.name.is_empty() && !self.value.is_null()
    }
}

/// A free-form event with a type name and payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    /// Event type name.
    pub event_type: String,
    /// Free-form payload.
    pub payload: Value,
}

impl EventData {
    /// Creates an event.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Structural validity: a type name is required.
    pub fn is_valid(&self) -> bool {
        !self.event_type.is_empty()
    }
}

/// A GPS location fix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: u32,
    /// Speed in m/s, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
    /// Altitude in meters, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<i32>,
}

impl LocationUpdate {
    /// Creates a location update from a coordinate pair.
    pub fn new(latitude: f64, longitude: f64, accuracy: u32) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            speed: None,
            altitude: None,
        }
    }

    /// Sets the speed.
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Sets the altitude.
    pub fn with_altitude(mut self, altitude: i32) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Structural validity: coordinates must be finite and in range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// # One telemetry item.
///
/// Producers emit entities into their output stream; the dispatcher consumes
/// the merged stream and classifies each item by variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A sensor reading.
    Sensor(SensorUpdate),
    /// A free-form event.
    Event(EventData),
    /// A location fix.
    Location(LocationUpdate),
}

impl Entity {
    /// Checks structural validity of the wrapped value.
    pub fn is_valid(&self) -> bool {
        match self {
            Entity::Sensor(sensor) => sensor.is_valid(),
            Entity::Event(event) => event.is_valid(),
            Entity::Location(location) => location.is_valid(),
        }
    }

    /// Short variant label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Sensor(_) => "sensor",
            Entity::Event(_) => "event",
            Entity::Location(_) => "location",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sensor_builder_sets_metadata() {
        let sensor = SensorUpdate::new("cpu_temp", "CPU Temperature", json!(42.5))
            .with_unit("°C")
            .with_device_class("temperature")
            .with_state_class("measurement")
            .diagnostic();

        assert_eq!(sensor.unit.as_deref(), Some("°C"));
        assert_eq!(sensor.category, EntityCategory::Diagnostic);
        assert!(sensor.is_valid());
    }

    #[test]
    fn sensor_without_id_is_invalid() {
        let sensor = SensorUpdate::new("", "Nameless", json!(1));
        assert!(!sensor.is_valid());
        assert!(!Entity::Sensor(sensor).is_valid());
    }

    #[test]
    fn sensor_with_null_value_is_invalid() {
        let sensor = SensorUpdate::new("x", "X", Value::Null);
        assert!(!sensor.is_valid());
    }

    #[test]
    fn location_range_checks() {
        assert!(LocationUpdate::new(52.5, 13.4, 10).is_valid());
        assert!(!LocationUpdate::new(95.0, 13.4, 10).is_valid());
        assert!(!LocationUpdate::new(f64::NAN, 13.4, 10).is_valid());
    }

    #[test]
    fn event_requires_type_name() {
        assert!(EventData::new("session_started", json!({"user": "amy"})).is_valid());
        assert!(!EventData::new("", json!({})).is_valid());
    }
}
