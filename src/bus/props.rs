//! # Canonical signal-body decoding.
//!
//! Two well-known signal shapes are decoded here:
//!
//! - the properties-changed 3-tuple `(interface, changed-map,
//!   invalidated-list)` via [`parse_properties_changed`], and
//! - the simple value-change pair `(new, old)` via [`parse_value_change`].
//!
//! Decoding fails atomically: a malformed element yields its specific error
//! and no partial result, so callers can distinguish "not the signal I
//! expected" from "malformed payload".

use std::collections::HashMap;

use crate::bus::value::BusValue;
use crate::error::BusError;

/// Parsed canonical properties-changed payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties {
    /// Interface whose properties changed.
    pub interface: String,
    /// Changed properties and their new values.
    pub changed: HashMap<String, BusValue>,
    /// Properties whose values were invalidated.
    pub invalidated: Vec<String>,
}

/// A property value change with old and new values.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueChange<T> {
    /// The new value.
    pub new: T,
    /// The old value.
    pub old: T,
}

/// Decodes a properties-changed signal body into [`Properties`].
///
/// The body must be the canonical 3-tuple. Each element failure has its own
/// error so callers can tell which part was malformed:
/// [`BusError::NotPropertiesChanged`] (shape), [`BusError::ParseInterface`],
/// [`BusError::ParseChanged`], [`BusError::ParseInvalidated`].
pub fn parse_properties_changed(content: &[BusValue]) -> Result<Properties, BusError> {
    if content.len() != 3 {
        return Err(BusError::NotPropertiesChanged);
    }

    let interface = match &content[0] {
        BusValue::Str(name) => name.clone(),
        _ => return Err(BusError::ParseInterface),
    };

    let changed = match &content[1] {
        BusValue::Dict(map) => map.clone(),
        _ => return Err(BusError::ParseChanged),
    };

    let invalidated = match &content[2] {
        BusValue::StrList(names) => names.clone(),
        BusValue::List(items) => items
            .iter()
            .map(|item| match item {
                BusValue::Str(name) => Ok(name.clone()),
                _ => Err(BusError::ParseInvalidated),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(BusError::ParseInvalidated),
    };

    Ok(Properties {
        interface,
        changed,
        invalidated,
    })
}

/// Checks whether `property` changed in the given signal body and, if so,
/// converts its new value to `T`.
///
/// Returns `Ok(None)` when the body is a valid properties-changed payload
/// that does not mention the property.
pub fn has_property_changed<T>(content: &[BusValue], property: &str) -> Result<Option<T>, BusError>
where
    T: TryFrom<BusValue, Error = BusError>,
{
    let props = parse_properties_changed(content)?;

    match props.changed.get(property) {
        Some(value) => T::try_from(value.clone()).map(Some),
        None => Ok(None),
    }
}

/// Decodes a `(new, old)` value-change signal body.
pub fn parse_value_change<T>(content: &[BusValue]) -> Result<ValueChange<T>, BusError>
where
    T: TryFrom<BusValue, Error = BusError>,
{
    if content.len() != 2 {
        return Err(BusError::NotValueChanged);
    }

    let new = T::try_from(content[0].clone()).map_err(|_| BusError::ParseNewValue)?;
    let old = T::try_from(content[1].clone()).map_err(|_| BusError::ParseOldValue)?;

    Ok(ValueChange { new, old })
}
