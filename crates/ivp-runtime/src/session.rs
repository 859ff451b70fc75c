//! Live session driver: sleep until the next refresh point, poll, repeat.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::RuntimeError;
use crate::schedule::next_refresh_after;
use crate::task::{PollOutcome, ScheduledTask};

/// Exchange-local wall clock.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    async fn sleep_until(&self, target: NaiveDateTime);
}

/// Real time in the exchange's zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    async fn sleep_until(&self, target: NaiveDateTime) {
        if let Ok(wait) = (target - self.now()).to_std() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Clock that jumps straight to each sleep target. Deterministic sessions
/// for tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, t: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = t;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn sleep_until(&self, target: NaiveDateTime) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if target > *now {
            *now = target;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// The task saw the session's final slot.
    Finished,
    /// No refresh point left today.
    ScheduleExhausted,
    Fatal(RuntimeError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub polls: usize,
    pub updates: usize,
    pub retries: usize,
    pub end: SessionEnd,
}

/// Drive `task` through one trading day.
///
/// Polls once on start (to catch up mid-session), then at every refresh point
/// in `schedule`. Retryable failures are counted and polling continues; a
/// fatal outcome or the end of the schedule stops the task.
pub async fn run_live_session(
    task: &mut dyn ScheduledTask,
    schedule: &[NaiveTime],
    clock: &dyn Clock,
) -> SessionSummary {
    let mut summary = SessionSummary {
        polls: 0,
        updates: 0,
        retries: 0,
        end: SessionEnd::ScheduleExhausted,
    };

    if let Err(e) = task.start().await {
        warn!(task = task.name(), error = %e, "task failed to start");
        summary.end = SessionEnd::Fatal(e);
        return summary;
    }

    loop {
        let now = clock.now();
        summary.polls += 1;
        match task.poll(now).await {
            PollOutcome::Updated(_) => summary.updates += 1,
            PollOutcome::Idle => {}
            PollOutcome::Retry(e) => {
                summary.retries += 1;
                debug!(error = %e, "retrying at next refresh point");
            }
            PollOutcome::Finished => {
                summary.updates += 1;
                summary.end = SessionEnd::Finished;
                break;
            }
            PollOutcome::Fatal(e) => {
                summary.end = SessionEnd::Fatal(e);
                break;
            }
        }

        let Some(next) = next_refresh_after(schedule, now.time()) else {
            summary.end = SessionEnd::ScheduleExhausted;
            break;
        };
        clock.sleep_until(now.date().and_time(next)).await;
    }

    task.stop().await;
    info!(
        task = task.name(),
        polls = summary.polls,
        updates = summary.updates,
        retries = summary.retries,
        end = ?summary.end,
        "live session ended"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[tokio::test]
    async fn manual_clock_never_moves_backwards() {
        let clock = ManualClock::new(at(10, 0, 0));
        clock.sleep_until(at(10, 5, 1)).await;
        assert_eq!(clock.now(), at(10, 5, 1));
        clock.sleep_until(at(9, 0, 0)).await;
        assert_eq!(clock.now(), at(10, 5, 1));
    }

    #[tokio::test]
    async fn system_clock_returns_immediately_for_past_targets() {
        let clock = SystemClock::new(chrono_tz::Asia::Shanghai);
        let before = clock.now();
        clock.sleep_until(before - chrono::Duration::minutes(5)).await;
        assert!(clock.now() >= before);
    }
}
