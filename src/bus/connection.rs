//! # Bus handle and the connection collaborator contract.
//!
//! The hosting process owns the actual transport and hands the runtime a
//! live [`BusConnection`]. A [`Bus`] wraps the connection (or its absence)
//! and is cheap to clone; every property, method and watch helper goes
//! through [`Bus::connection`], which turns a missing connection into
//! [`BusError::NoBus`] instead of a null dereference.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::bus::introspect::Introspection;
use crate::bus::value::BusValue;
use crate::error::BusError;

/// Which bus a connection is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusKind {
    /// Per-user session bus.
    Session,
    /// System-wide bus.
    System,
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::Session => write!(f, "session"),
            BusKind::System => write!(f, "system"),
        }
    }
}

/// One raw signal received on the connection.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    /// Fully-qualified signal name.
    pub name: String,
    /// Object path the signal was emitted from.
    pub path: String,
    /// Signal body.
    pub body: Vec<BusValue>,
}

/// One match rule handed to the connection when a watch starts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchRule {
    /// Match messages sent from or to the given object path.
    Path(String),
    /// Match messages whose object path is under the given namespace.
    PathNamespace(String),
    /// Match messages on the given interface.
    Interface(String),
    /// Match messages with the given member (signal or method) name.
    Member(String),
    /// Match on a positional string argument in the message body.
    Arg(u8, String),
    /// Match messages whose first argument is a name under the given namespace.
    Arg0Namespace(String),
}

/// # Contract for a live bus connection.
///
/// Supplied by the hosting process before any watch is started. The
/// connection is shared read-only by many concurrent watches and property
/// calls; implementations must be safe for that.
///
/// `signals()` returns a fresh broadcast receiver observing every signal
/// arriving on the connection; watches do their own filtering.
#[async_trait]
pub trait BusConnection: Send + Sync {
    /// Reads a property on `path` / `interface`.
    async fn get_property(
        &self,
        path: &str,
        interface: &str,
        name: &str,
    ) -> Result<BusValue, BusError>;

    /// Writes a property on `path` / `interface`.
    async fn set_property(
        &self,
        path: &str,
        interface: &str,
        name: &str,
        value: BusValue,
    ) -> Result<(), BusError>;

    /// Invokes a method and returns its output values.
    async fn call(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: Vec<BusValue>,
    ) -> Result<Vec<BusValue>, BusError>;

    /// Fetches introspection data for the object at `path`.
    async fn introspect(&self, path: &str, interface: &str) -> Result<Introspection, BusError>;

    /// Adds a set of match rules (one logical watch condition).
    async fn add_match(&self, rules: &[MatchRule]) -> Result<(), BusError>;

    /// Removes a previously added set of match rules.
    async fn remove_match(&self, rules: &[MatchRule]) -> Result<(), BusError>;

    /// Subscribes to every signal arriving on the connection.
    fn signals(&self) -> broadcast::Receiver<Signal>;
}

/// # Handle to a particular bus.
///
/// Cheap to clone (the connection is behind an `Arc`). A bus constructed
/// with [`Bus::disconnected`] fails every operation with
/// [`BusError::NoBus`]; this is the state before the hosting process has
/// supplied a connection.
#[derive(Clone)]
pub struct Bus {
    kind: BusKind,
    conn: Option<Arc<dyn BusConnection>>,
}

impl Bus {
    /// Creates a bus handle around a live connection.
    pub fn new(kind: BusKind, conn: Arc<dyn BusConnection>) -> Self {
        Self {
            kind,
            conn: Some(conn),
        }
    }

    /// Creates a bus handle with no connection. All operations fail with
    /// [`BusError::NoBus`].
    pub fn disconnected(kind: BusKind) -> Self {
        Self { kind, conn: None }
    }

    /// Which bus this handle refers to.
    pub fn kind(&self) -> BusKind {
        self.kind
    }

    /// Whether a live connection is attached.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the live connection or [`BusError::NoBus`].
    pub(crate) fn connection(&self) -> Result<&Arc<dyn BusConnection>, BusError> {
        self.conn.as_ref().ok_or(BusError::NoBus)
    }

    /// Fetches data by calling `method` on the object at `path`, converting
    /// the first output value to `T`.
    pub async fn get_data<T>(
        &self,
        path: &str,
        interface: &str,
        method: &str,
        args: Vec<BusValue>,
    ) -> Result<T, BusError>
    where
        T: TryFrom<BusValue, Error = BusError>,
    {
        tracing::trace!(bus = %self.kind, path, interface, method, "getting data");
        let conn = self.connection()?;
        let mut out = conn.call(path, interface, method, args).await?;
        if out.is_empty() {
            return Err(BusError::Conversion {
                value: "empty method reply".to_owned(),
                target: std::any::type_name::<T>(),
            });
        }
        T::try_from(out.remove(0))
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("kind", &self.kind)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

// Test connection shared by the bus unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory connection: scripted properties, call recording, manual
    /// signal injection.
    pub struct FakeConnection {
        pub properties: Mutex<HashMap<(String, String, String), BusValue>>,
        pub calls: Mutex<Vec<(String, String, String, Vec<BusValue>)>>,
        pub matches: Mutex<Vec<Vec<MatchRule>>>,
        pub introspection: Mutex<Option<Introspection>>,
        // Refuse add_match once this many rule sets are registered.
        pub match_capacity: Mutex<Option<usize>>,
        signals: broadcast::Sender<Signal>,
    }

    impl FakeConnection {
        pub fn new() -> Self {
            let (signals, _) = broadcast::channel(64);
            Self {
                properties: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                matches: Mutex::new(Vec::new()),
                introspection: Mutex::new(None),
                match_capacity: Mutex::new(None),
                signals,
            }
        }

        pub fn set_prop(&self, path: &str, interface: &str, name: &str, value: BusValue) {
            self.properties.lock().unwrap().insert(
                (path.to_owned(), interface.to_owned(), name.to_owned()),
                value,
            );
        }

        pub fn emit(&self, signal: Signal) {
            let _ = self.signals.send(signal);
        }

        pub fn active_matches(&self) -> usize {
            self.matches.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BusConnection for FakeConnection {
        async fn get_property(
            &self,
            path: &str,
            interface: &str,
            name: &str,
        ) -> Result<BusValue, BusError> {
            self.properties
                .lock()
                .unwrap()
                .get(&(path.to_owned(), interface.to_owned(), name.to_owned()))
                .cloned()
                .ok_or_else(|| BusError::Transport(format!("no such property: {name}")))
        }

        async fn set_property(
            &self,
            path: &str,
            interface: &str,
            name: &str,
            value: BusValue,
        ) -> Result<(), BusError> {
            self.set_prop(path, interface, name, value);
            Ok(())
        }

        async fn call(
            &self,
            path: &str,
            interface: &str,
            method: &str,
            args: Vec<BusValue>,
        ) -> Result<Vec<BusValue>, BusError> {
            self.calls.lock().unwrap().push((
                path.to_owned(),
                interface.to_owned(),
                method.to_owned(),
                args,
            ));
            Ok(Vec::new())
        }

        async fn introspect(
            &self,
            _path: &str,
            _interface: &str,
        ) -> Result<Introspection, BusError> {
            self.introspection
                .lock()
                .unwrap()
                .clone()
                .ok_or(BusError::IntrospectionUnavailable)
        }

        async fn add_match(&self, rules: &[MatchRule]) -> Result<(), BusError> {
            let mut matches = self.matches.lock().unwrap();
            if let Some(capacity) = *self.match_capacity.lock().unwrap() {
                if matches.len() >= capacity {
                    return Err(BusError::Transport("match rule refused".to_owned()));
                }
            }
            matches.push(rules.to_vec());
            Ok(())
        }

        async fn remove_match(&self, rules: &[MatchRule]) -> Result<(), BusError> {
            let mut matches = self.matches.lock().unwrap();
            if let Some(pos) = matches.iter().position(|r| r == rules) {
                matches.remove(pos);
            }
            Ok(())
        }

        fn signals(&self) -> broadcast::Receiver<Signal> {
            self.signals.subscribe()
        }
    }
}
