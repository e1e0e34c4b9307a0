//! Wall-clock daily triggers.
//!
//! Every wait is recomputed from the local clock after each firing, so a
//! machine that slept through a target or crossed a DST change lands on
//! the next real occurrence instead of drifting by a fixed 24 hours.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use log::info;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Longest stretch of skipped wall time searched when a target falls in a
/// DST gap.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// A local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTime {
    time: NaiveTime,
}

impl DailyTime {
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(|time| Self { time })
            .ok_or_else(|| anyhow!("invalid time of day {hour:02}:{minute:02}:{second:02}"))
    }

    /// Parses `HH:MM` or `HH:MM:SS`.
    pub fn parse(text: &str) -> Result<Self> {
        NaiveTime::parse_from_str(text, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .map(|time| Self { time })
            .map_err(|err| anyhow!("invalid time of day {text:?}: {err}"))
    }

    pub fn naive(self) -> NaiveTime {
        self.time
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M:%S"))
    }
}

/// First instant strictly after `now` whose local time is `at`. A target
/// equal to `now` counts as already passed.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, at: DailyTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.naive_local().date().and_time(at.naive());
    let candidate = resolve_local(&tz, today);
    if candidate > *now {
        return candidate;
    }
    resolve_local(&tz, today + chrono::Duration::days(1))
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    if let Some(resolved) = tz.from_local_datetime(&local).earliest() {
        return resolved;
    }
    // Skipped by a forward jump. Offset changes land on whole minutes, so the
    // first valid minute is where the gap ends.
    let minute = local
        .with_second(0)
        .and_then(|time| time.with_nanosecond(0))
        .unwrap_or(local);
    (1..=MAX_GAP_MINUTES)
        .map(|step| minute + chrono::Duration::minutes(step))
        .find_map(|probe| tz.from_local_datetime(&probe).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&local))
}

pub fn delay_until<Tz: TimeZone>(now: &DateTime<Tz>, target: &DateTime<Tz>) -> Duration {
    target
        .clone()
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Runs `fire` every day at `at` until the task is aborted.
pub fn spawn_daily<F, Fut>(
    runtime: &Handle,
    clock: Arc<dyn Clock>,
    name: &'static str,
    at: DailyTime,
    mut fire: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    runtime.spawn(async move {
        let mut last_fired: Option<DateTime<Local>> = None;
        loop {
            let now = clock.now();
            let reference = match last_fired {
                Some(fired) if fired > now => fired,
                _ => now,
            };
            let target = next_occurrence(&reference, at);
            let wait = delay_until(&now, &target);
            info!(
                "{name} scheduled for {} (in {}m)",
                target.format("%Y-%m-%d %H:%M:%S"),
                wait.as_secs() / 60
            );

            tokio::time::sleep(wait).await;
            fire().await;
            last_fired = Some(target);
        }
    })
}
