//! # The scheduler itself.
//!
//! One process-wide [`Scheduler`] bound to the root cancellation token.
//! Each scheduled job gets its own loop task: sleep until the trigger's
//! next firing, spawn the execution as a detached task, repeat. Execution
//! failures are logged by the detached task and never propagate; because
//! the loop never awaits the job body, a slow execution cannot push the
//! next firing late. Cancelling the token stops every loop at its next suspension
//! point; jobs owned by a producer simply stop firing when that producer's
//! token dies, without explicit per-job cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::scheduler::job::Job;
use crate::scheduler::trigger::ScheduleTrigger;

/// Opaque identifier of a scheduled job.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobKey(String);

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Process-wide job scheduler.
///
/// Cheap to clone; all clones share the same job table. Construct exactly
/// one with [`Scheduler::start`] at startup and pass the handle to anything
/// that schedules jobs — the instance is explicit, injected state, not a
/// hidden global.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    token: CancellationToken,
    next_id: AtomicU64,
    // Job key -> description, for logging and introspection only.
    jobs: Mutex<HashMap<JobKey, String>>,
}

impl Scheduler {
    /// Creates the scheduler bound to `token`. Every job loop stops when
    /// the token is cancelled; there is no separate stop call.
    pub fn start(token: CancellationToken) -> Self {
        debug!("starting scheduler");
        Self {
            inner: Arc::new(Inner {
                token,
                next_id: AtomicU64::new(0),
                jobs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Registers `job` to run on `trigger` and starts its loop.
    ///
    /// Returns the generated job key. Fails only when the trigger cannot
    /// produce a firing (a cron schedule with no upcoming occurrence);
    /// execution errors inside the job are logged and never abort the
    /// scheduler.
    pub fn schedule_job(
        &self,
        job: Arc<dyn Job>,
        trigger: ScheduleTrigger,
    ) -> Result<JobKey, ScheduleError> {
        if trigger.next_delay().is_none() {
            return Err(ScheduleError::InvalidCron {
                expression: trigger.to_string(),
                reason: "schedule has no upcoming firing".to_owned(),
            });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let key = JobKey(format!("job-{id}"));

        self.inner
            .jobs
            .lock()
            .expect("scheduler job table poisoned")
            .insert(key.clone(), job.description().to_owned());

        debug!(job_key = %key, job = job.description(), trigger = %trigger, "scheduled job");

        let token = self.inner.token.clone();
        let loop_key = key.clone();
        tokio::spawn(async move {
            loop {
                let Some(delay) = trigger.next_delay() else {
                    debug!(job_key = %loop_key, "schedule exhausted, stopping job loop");
                    break;
                };

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                // Executions run detached so a slow job body cannot push
                // the next firing past its trigger time.
                let run = job.clone();
                let run_key = loop_key.clone();
                let child = token.child_token();
                tokio::spawn(async move {
                    if let Err(err) = run.execute(child).await {
                        warn!(
                            job_key = %run_key,
                            job = run.description(),
                            error = %err,
                            "job execution failed",
                        );
                    }
                });
            }
        });

        Ok(key)
    }

    /// Number of jobs registered so far.
    pub fn job_count(&self) -> usize {
        self.inner
            .jobs
            .lock()
            .expect("scheduler job table poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::job::JobFn;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_job(counter: Arc<AtomicUsize>) -> Arc<dyn Job> {
        JobFn::arc("count firings", move |_token| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn interval_trigger_fires_repeatedly() {
        let token = CancellationToken::new();
        let scheduler = Scheduler::start(token.clone());
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_job(
                counting_job(counter.clone()),
                ScheduleTrigger::every(Duration::from_secs(10)),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_job_does_not_delay_the_next_firing() {
        let token = CancellationToken::new();
        let scheduler = Scheduler::start(token.clone());
        let counter = Arc::new(AtomicUsize::new(0));

        // Body takes half the interval; firings must still land at
        // 10s, 20s, 30s rather than stretching to a 15s cadence.
        let firings = counter.clone();
        let slow = JobFn::arc("slow sampler", move |_token| {
            let firings = firings.clone();
            async move {
                firings.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        });

        scheduler
            .schedule_job(slow, ScheduleTrigger::every(Duration::from_secs(10)))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_firing() {
        let token = CancellationToken::new();
        let scheduler = Scheduler::start(token.clone());
        let counter = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule_job(
                counting_job(counter.clone()),
                ScheduleTrigger::every(Duration::from_secs(10)),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_secs(15)).await;
        token.cancel();
        let fired = counter.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), fired);
    }

    #[tokio::test(start_paused = true)]
    async fn job_failure_does_not_abort_the_loop() {
        let token = CancellationToken::new();
        let scheduler = Scheduler::start(token.clone());
        let counter = Arc::new(AtomicUsize::new(0));

        let attempts = counter.clone();
        let failing = JobFn::arc("always fails", move |_token| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ScheduleError::JobFailed("boom".to_owned()))
            }
        });

        scheduler
            .schedule_job(failing, ScheduleTrigger::every(Duration::from_secs(5)))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(counter.load(Ordering::SeqCst) >= 3);

        token.cancel();
    }

    #[tokio::test]
    async fn keys_are_unique_and_jobs_are_tracked() {
        let scheduler = Scheduler::start(CancellationToken::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let first = scheduler
            .schedule_job(
                counting_job(counter.clone()),
                ScheduleTrigger::every(Duration::from_secs(3600)),
            )
            .unwrap();
        let second = scheduler
            .schedule_job(
                counting_job(counter),
                ScheduleTrigger::every(Duration::from_secs(3600)),
            )
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(scheduler.job_count(), 2);
    }
}
