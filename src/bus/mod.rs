//! # Bus abstraction: typed access to a local inter-process bus.
//!
//! Producers need three things from the local system bus: reading/writing
//! properties, invoking methods, and subscribing to asynchronous signals.
//! This module wraps all three behind typed helpers so workers never
//! hand-roll low-level marshaling:
//!
//! - [`Property`] — typed get/set of a named property on an object path.
//! - [`Method`] — method invocation with introspection-driven argument
//!   coercion (best-effort, warnings instead of hard failures).
//! - [`Watch`] — builder for standing signal subscriptions; `start` yields
//!   a queue of [`Trigger`] values and tears everything down on cancel.
//! - [`parse_properties_changed`] — decoding of the canonical
//!   properties-changed signal body into [`Properties`].
//!
//! The live connection itself is an external collaborator behind the
//! [`BusConnection`] trait, supplied by the hosting process before any watch
//! is started. A [`Bus`] with no connection fails every operation with
//! [`BusError::NoBus`](crate::error::BusError::NoBus) rather than panicking.
//!
//! ## Architecture
//! ```text
//!  worker ──► Watch::start(token, bus) ──► listening task ──► Trigger queue
//!                   │                          │
//!                   │ add_match(rules)         │ filters by path /
//!                   ▼                          ▼ path-namespace
//!            ┌─────────────────────────────────────────┐
//!            │  BusConnection (hosting process owned)  │
//!            └─────────────────────────────────────────┘
//!                   ▲                          ▲
//!        Property::get/set            Method::call (introspect + coerce)
//! ```

mod connection;
mod introspect;
mod method;
mod property;
mod props;
mod value;
mod watch;

pub use connection::{Bus, BusConnection, BusKind, MatchRule, Signal};
pub use introspect::{ArgDirection, ArgSpec, InterfaceSpec, Introspection, MethodSpec};
pub use method::Method;
pub use property::Property;
pub use props::{
    has_property_changed, parse_properties_changed, parse_value_change, Properties, ValueChange,
};
pub use value::BusValue;
pub use watch::{Trigger, Watch};

/// Canonical properties interface name.
pub const PROP_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Canonical properties-changed signal member.
pub const PROP_CHANGED_MEMBER: &str = "PropertiesChanged";
