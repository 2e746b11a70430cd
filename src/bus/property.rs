//! # Typed property access.
//!
//! [`Property`] reads and writes one named property on an object path +
//! interface, decoding to and encoding from a native type. A value that
//! cannot be converted to `T` fails with a typed
//! [`BusError::Conversion`](crate::error::BusError::Conversion).
//!
//! ## Example
//! ```no_run
//! # async fn demo(bus: hostlink::Bus) -> Result<(), hostlink::BusError> {
//! use hostlink::Property;
//!
//! let brightness = Property::<u32>::new(
//!     bus,
//!     "/org/example/backlight",
//!     "org.example.Backlight",
//!     "Brightness",
//! );
//! let current = brightness.get().await?;
//! brightness.set(current / 2).await?;
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;

use crate::bus::connection::Bus;
use crate::bus::value::BusValue;
use crate::error::BusError;

/// A named property on a given object path and interface, typed as `T`.
#[derive(Clone, Debug)]
pub struct Property<T> {
    bus: Bus,
    path: String,
    interface: String,
    name: String,
    _value: PhantomData<T>,
}

impl<T> Property<T>
where
    T: TryFrom<BusValue, Error = BusError> + Into<BusValue>,
{
    /// Creates a property accessor.
    pub fn new(
        bus: Bus,
        path: impl Into<String>,
        interface: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            path: path.into(),
            interface: interface.into(),
            name: name.into(),
            _value: PhantomData,
        }
    }

    /// Reads the property, decoding it to `T`.
    pub async fn get(&self) -> Result<T, BusError> {
        tracing::trace!(
            bus = %self.bus.kind(),
            path = %self.path,
            interface = %self.interface,
            property = %self.name,
            "requesting property",
        );

        let conn = self.bus.connection()?;
        let raw = conn
            .get_property(&self.path, &self.interface, &self.name)
            .await?;

        T::try_from(raw)
    }

    /// Writes the property.
    pub async fn set(&self, value: T) -> Result<(), BusError> {
        tracing::trace!(
            bus = %self.bus.kind(),
            path = %self.path,
            interface = %self.interface,
            property = %self.name,
            "setting property",
        );

        let conn = self.bus.connection()?;
        conn.set_property(&self.path, &self.interface, &self.name, value.into())
            .await
    }
}
