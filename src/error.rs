//! Error types used across the hostlink runtime.
//!
//! Each component surfaces its own error enum:
//!
//! - [`BusError`] — bus access, signal parsing and value conversion failures.
//! - [`RegistryError`] — registry load/store failures.
//! - [`ScheduleError`] — trigger validation and job execution failures.
//! - [`WorkerError`] — producer start failures.
//! - [`DeliveryError`] — remote delivery failures.
//!
//! Propagation policy: components return errors to their direct caller.
//! Only the dispatcher and the worker manager absorb errors into log lines,
//! because they sit at the boundary where one producer's failure must not
//! affect the others.

use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced by the bus abstraction.
///
/// Covers the property/method/watch surface as well as signal-body parsing.
/// Parse variants are distinct so callers can tell "not a properties-changed
/// signal" apart from "malformed payload".
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// No live bus connection is available.
    #[error("no bus connection")]
    NoBus,

    /// A bus value could not be converted to the requested type.
    #[error("cannot convert bus value {value} to {target}")]
    Conversion {
        /// Debug rendering of the offending value.
        value: String,
        /// Name of the requested target type or signature.
        target: &'static str,
    },

    /// The underlying connection reported a transport-level failure.
    #[error("bus transport error: {0}")]
    Transport(String),

    /// Introspection data is not available for the target object.
    #[error("introspection not available on object")]
    IntrospectionUnavailable,

    /// The named method was not found in the object's introspection data.
    #[error("method {0} not found on object")]
    UnknownMethod(String),

    /// Signal contents do not appear to represent changed properties.
    #[error("signal contents do not appear to represent changed properties")]
    NotPropertiesChanged,

    /// Could not parse the interface name of a properties-changed signal.
    #[error("could not parse interface name")]
    ParseInterface,

    /// Could not parse the changed-properties map of a properties-changed signal.
    #[error("could not parse changed properties")]
    ParseChanged,

    /// Could not parse the invalidated-properties list of a properties-changed signal.
    #[error("could not parse invalidated properties")]
    ParseInvalidated,

    /// Signal contents do not appear to represent a value change.
    #[error("signal contents do not appear to represent a value change")]
    NotValueChanged,

    /// Could not parse the new value of a value-change signal.
    #[error("could not parse new value")]
    ParseNewValue,

    /// Could not parse the old value of a value-change signal.
    #[error("could not parse old value")]
    ParseOldValue,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::NoBus => "bus_unavailable",
            BusError::Conversion { .. } => "bus_conversion",
            BusError::Transport(_) => "bus_transport",
            BusError::IntrospectionUnavailable => "bus_no_introspection",
            BusError::UnknownMethod(_) => "bus_unknown_method",
            BusError::NotPropertiesChanged => "bus_not_prop_changed",
            BusError::ParseInterface => "bus_parse_interface",
            BusError::ParseChanged => "bus_parse_changed",
            BusError::ParseInvalidated => "bus_parse_invalidated",
            BusError::NotValueChanged => "bus_not_value_changed",
            BusError::ParseNewValue => "bus_parse_new_value",
            BusError::ParseOldValue => "bus_parse_old_value",
        }
    }
}

/// # Errors produced by the registry.
///
/// A decode failure other than an empty file is fatal at load time:
/// continuing with unknown registration state risks duplicate registration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The backing store could not be read or written.
    #[error("registry i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store exists but does not decode as a registry map.
    #[error("registry store is corrupt: {0}")]
    Corrupt(String),

    /// Reset was requested but no backing store exists at the path.
    #[error("no registry store at {0}")]
    NotFound(PathBuf),
}

/// # Errors produced by the scheduler.
///
/// Registration of a job can only fail on a malformed trigger. Execution
/// errors belong to the job itself and never abort the scheduler.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// A cron expression could not be parsed.
    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron {
        /// The expression as given by the caller.
        expression: String,
        /// Parser detail.
        reason: String,
    },

    /// An `@every <duration>` form carried an unparseable duration.
    #[error("invalid duration {duration:?} in @every trigger")]
    InvalidEvery {
        /// The duration text as given by the caller.
        duration: String,
    },

    /// A jittered trigger was built with a jitter bound larger than the interval.
    #[error("jitter {jitter:?} exceeds interval {interval:?}")]
    InvalidJitter {
        /// The base interval.
        interval: std::time::Duration,
        /// The offending jitter bound.
        jitter: std::time::Duration,
    },

    /// A job body failed. Logged by the job loop, never propagated further.
    #[error("job execution failed: {0}")]
    JobFailed(String),
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::InvalidCron { .. } => "schedule_invalid_cron",
            ScheduleError::InvalidEvery { .. } => "schedule_invalid_every",
            ScheduleError::InvalidJitter { .. } => "schedule_invalid_jitter",
            ScheduleError::JobFailed(_) => "schedule_job_failed",
        }
    }
}

/// # Errors produced when starting a producer.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The producer could not be started.
    #[error("worker failed to start: {0}")]
    Start(String),

    /// The producer's bus setup failed (missing connection, bad watch spec).
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// # Errors produced by the remote delivery collaborator.
///
/// Always non-fatal to the dispatch loop; retry happens naturally the next
/// time the same work item appears.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The request could not be sent or the remote returned an error status.
    #[error("send request failed: {0}")]
    Request(String),

    /// The remote rejected the payload as invalid.
    #[error("request rejected: {0}")]
    Rejected(String),
}
