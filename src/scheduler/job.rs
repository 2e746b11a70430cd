//! # Schedulable unit and the closure adapter.
//!
//! Anything that can be scheduled implements [`Job`]: an async `execute`
//! that receives a cancellation token, plus a human-readable description
//! used only for logging. [`JobFn`] wraps a closure so callers don't need a
//! struct for every small polling body.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ScheduleError;

/// # A schedulable unit of work.
///
/// `execute` is invoked once per trigger firing. Implementations should
/// check `token` liveness and return promptly during shutdown; the
/// scheduler has no per-job cancellation beyond the token.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Runs one firing of the job.
    async fn execute(&self, token: CancellationToken) -> Result<(), ScheduleError>;

    /// Human-readable description, used only for logging.
    fn description(&self) -> &str;
}

/// Function-backed job.
///
/// Wraps a closure that creates a fresh future per firing, so no state is
/// shared between firings unless the closure captures an `Arc` explicitly.
///
/// ## Example
/// ```rust
/// use hostlink::{Job, JobFn, ScheduleError};
/// use tokio_util::sync::CancellationToken;
///
/// let job = JobFn::arc("poll battery level", |token: CancellationToken| async move {
///     if token.is_cancelled() {
///         return Ok(());
///     }
///     // read the sensor...
///     Ok::<_, ScheduleError>(())
/// });
/// assert_eq!(job.description(), "poll battery level");
/// ```
pub struct JobFn<F> {
    description: Cow<'static, str>,
    f: F,
}

impl<F> JobFn<F> {
    /// Creates a function-backed job.
    pub fn new(description: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            description: description.into(),
            f,
        }
    }

    /// Creates the job and returns it as a shared handle.
    pub fn arc(description: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(description, f))
    }
}

#[async_trait]
impl<F, Fut> Job for JobFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ScheduleError>> + Send + 'static,
{
    async fn execute(&self, token: CancellationToken) -> Result<(), ScheduleError> {
        (self.f)(token).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}
