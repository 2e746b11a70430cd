//! # Trigger-based job scheduling.
//!
//! Polling producers should not each manage their own timer logic. The
//! scheduler runs any [`Job`] on a [`ScheduleTrigger`]:
//!
//! - cron expressions (5/6/7-field, `@hourly`-style aliases and the custom
//!   `@every <duration>` form),
//! - fixed intervals, and
//! - fixed intervals with bounded random jitter, so many independently
//!   scheduled pollers do not fire in synchronized bursts.
//!
//! One scheduler instance exists per process. It is explicit, injected
//! state: constructed once at startup with [`Scheduler::start`] and passed
//! to anything that schedules jobs. Job registration can only fail on a
//! malformed trigger; job *execution* errors are the job's own problem and
//! never abort the scheduler.

mod core;
mod job;
mod trigger;

pub use core::{JobKey, Scheduler};
pub use job::{Job, JobFn};
pub use trigger::ScheduleTrigger;
