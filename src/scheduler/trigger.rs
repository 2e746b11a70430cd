//! # Schedule triggers.
//!
//! A [`ScheduleTrigger`] decides when a job fires next:
//!
//! - [`ScheduleTrigger::cron`] — standard cron expressions. Both 5-field
//!   (minute-resolution) and 6/7-field (second-resolution) forms are
//!   accepted, as are the `@yearly`/`@monthly`/`@weekly`/`@daily`/`@hourly`
//!   aliases and the custom `@every <duration>` form.
//! - [`ScheduleTrigger::every`] — a fixed interval.
//! - [`ScheduleTrigger::every_with_jitter`] — a fixed interval plus a
//!   bounded uniform random offset; each firing lands in
//!   `[interval − jitter, interval + jitter]`.
//!
//! All validation happens at construction time, so a trigger held by the
//! scheduler can always produce its next delay.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use rand::Rng;

use crate::error::ScheduleError;

#[derive(Clone, Debug)]
enum Kind {
    Cron(Box<Schedule>),
    Every(Duration),
    Jitter { interval: Duration, jitter: Duration },
}

/// When a scheduled job fires. Created at schedule time, never mutated.
#[derive(Clone, Debug)]
pub struct ScheduleTrigger {
    kind: Kind,
}

impl ScheduleTrigger {
    /// Parses a cron-style trigger.
    ///
    /// Accepts 5-field expressions (a seconds field of `0` is prepended),
    /// 6/7-field expressions, the `@yearly`/`@annually`/`@monthly`/
    /// `@weekly`/`@daily`/`@midnight`/`@hourly` aliases, and
    /// `@every <duration>` (e.g. `@every 90s`, `@every 5m`).
    pub fn cron(expression: &str) -> Result<Self, ScheduleError> {
        let expression = expression.trim();

        if let Some(duration) = expression.strip_prefix("@every") {
            let duration = duration.trim();
            return parse_duration(duration)
                .map(Self::every)
                .ok_or_else(|| ScheduleError::InvalidEvery {
                    duration: duration.to_owned(),
                });
        }

        let normalized = match expression {
            "@yearly" | "@annually" => "0 0 0 1 1 *".to_owned(),
            "@monthly" => "0 0 0 1 * *".to_owned(),
            "@weekly" => "0 0 0 * * Sun".to_owned(),
            "@daily" | "@midnight" => "0 0 0 * * *".to_owned(),
            "@hourly" => "0 0 * * * *".to_owned(),
            other => {
                // 5-field forms get an explicit seconds field.
                if other.split_whitespace().count() == 5 {
                    format!("0 {other}")
                } else {
                    other.to_owned()
                }
            }
        };

        let schedule =
            Schedule::from_str(&normalized).map_err(|err| ScheduleError::InvalidCron {
                expression: expression.to_owned(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            kind: Kind::Cron(Box::new(schedule)),
        })
    }

    /// A fixed-interval trigger.
    pub fn every(interval: Duration) -> Self {
        Self {
            kind: Kind::Every(interval),
        }
    }

    /// A fixed-interval trigger with a bounded random offset per firing.
    ///
    /// Fails if `jitter` exceeds `interval`, which would allow a
    /// non-positive delay.
    pub fn every_with_jitter(interval: Duration, jitter: Duration) -> Result<Self, ScheduleError> {
        if jitter > interval {
            return Err(ScheduleError::InvalidJitter { interval, jitter });
        }

        Ok(Self {
            kind: Kind::Jitter { interval, jitter },
        })
    }

    /// The delay until the next firing, or `None` when the schedule has no
    /// further firings (a cron expression can run out).
    pub fn next_delay(&self) -> Option<Duration> {
        match &self.kind {
            Kind::Cron(schedule) => {
                let now = Utc::now();
                let next = schedule.after(&now).next()?;
                Some((next - now).to_std().unwrap_or(Duration::ZERO))
            }
            Kind::Every(interval) => Some(*interval),
            Kind::Jitter { interval, jitter } => {
                let jitter_ms = jitter.as_millis() as u64;
                if jitter_ms == 0 {
                    return Some(*interval);
                }
                // Uniform offset in [-jitter, +jitter].
                let offset = rand::rng().random_range(0..=jitter_ms.saturating_mul(2));
                Some(*interval - *jitter + Duration::from_millis(offset))
            }
        }
    }
}

impl fmt::Display for ScheduleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Cron(schedule) => write!(f, "cron {schedule}"),
            Kind::Every(interval) => write!(f, "every {interval:?}"),
            Kind::Jitter { interval, jitter } => {
                write!(f, "every {interval:?} ± {jitter:?}")
            }
        }
    }
}

/// Parses a compact duration such as `250ms`, `90s`, `5m`, `2h` or a
/// compound form like `1h30m`.
fn parse_duration(text: &str) -> Option<Duration> {
    if text.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = if c == 'm' && chars.peek() == Some(&'s') {
            chars.next();
            "ms"
        } else {
            match c {
                's' => "s",
                'm' => "m",
                'h' => "h",
                _ => return None,
            }
        };

        let amount: u64 = digits.parse().ok()?;
        digits.clear();

        let part = match unit {
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => Duration::from_secs(amount.checked_mul(60)?),
            "h" => Duration::from_secs(amount.checked_mul(3600)?),
            _ => unreachable!(),
        };
        total = total.checked_add(part)?;
    }

    // Trailing digits without a unit are malformed.
    if !digits.is_empty() || total.is_zero() {
        return None;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn firings(trigger: &ScheduleTrigger, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        match &trigger.kind {
            Kind::Cron(schedule) => schedule.after(&after).take(count).collect(),
            _ => panic!("not a cron trigger"),
        }
    }

    #[test]
    fn daily_alias_equals_explicit_expression() {
        let alias = ScheduleTrigger::cron("@daily").unwrap();
        let explicit = ScheduleTrigger::cron("0 0 0 * * *").unwrap();

        let start = Utc.with_ymd_and_hms(2025, 6, 1, 15, 30, 0).unwrap();
        assert_eq!(firings(&alias, start, 5), firings(&explicit, start, 5));
    }

    #[test]
    fn five_field_expressions_gain_a_seconds_field() {
        let five = ScheduleTrigger::cron("*/5 * * * *").unwrap();
        let six = ScheduleTrigger::cron("0 */5 * * * *").unwrap();

        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 30).unwrap();
        assert_eq!(firings(&five, start, 3), firings(&six, start, 3));
    }

    #[test]
    fn hourly_alias_fires_on_the_hour() {
        let trigger = ScheduleTrigger::cron("@hourly").unwrap();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 15, 0).unwrap();
        let next = firings(&trigger, start, 1)[0];
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn malformed_cron_is_rejected() {
        let err = ScheduleTrigger::cron("not a cron").unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidCron { .. }));
    }

    #[test]
    fn every_form_parses_durations() {
        let trigger = ScheduleTrigger::cron("@every 90s").unwrap();
        assert_eq!(trigger.next_delay(), Some(Duration::from_secs(90)));

        let trigger = ScheduleTrigger::cron("@every 1h30m").unwrap();
        assert_eq!(trigger.next_delay(), Some(Duration::from_secs(5400)));

        assert!(matches!(
            ScheduleTrigger::cron("@every soon").unwrap_err(),
            ScheduleError::InvalidEvery { .. }
        ));
        assert!(ScheduleTrigger::cron("@every").is_err());
    }

    #[test]
    fn overflowing_every_duration_is_rejected() {
        // Would wrap the seconds multiplication if left unchecked.
        assert!(matches!(
            ScheduleTrigger::cron("@every 5000000000000000000h").unwrap_err(),
            ScheduleError::InvalidEvery { .. }
        ));
    }

    #[test]
    fn jitter_delays_stay_within_bounds() {
        let interval = Duration::from_millis(1000);
        let jitter = Duration::from_millis(200);
        let trigger = ScheduleTrigger::every_with_jitter(interval, jitter).unwrap();

        for _ in 0..500 {
            let delay = trigger.next_delay().unwrap();
            assert!(delay >= interval - jitter, "delay {delay:?} below bound");
            assert!(delay <= interval + jitter, "delay {delay:?} above bound");
        }
    }

    #[test]
    fn zero_jitter_is_the_plain_interval() {
        let trigger =
            ScheduleTrigger::every_with_jitter(Duration::from_secs(30), Duration::ZERO).unwrap();
        assert_eq!(trigger.next_delay(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn jitter_larger_than_interval_is_rejected() {
        let err = ScheduleTrigger::every_with_jitter(
            Duration::from_secs(10),
            Duration::from_secs(11),
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidJitter { .. }));
    }
}
