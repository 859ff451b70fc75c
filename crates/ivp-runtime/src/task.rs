//! Schedulable tasks and the live poll task.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use ivp_engine::{AggregateResult, LiveSeries, LiveTracker, RawSample, SlotIndex};
use ivp_md::{LiveFetch, ProviderError, TradingCalendar};

use crate::error::RuntimeError;
use crate::events::{EventSender, ProfileEvent};

/// Result of one `poll`.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// New data was merged.
    Updated(LiveSeries),
    /// Nothing changed since the previous poll.
    Idle,
    /// Transient failure; poll again at the next refresh point.
    Retry(ProviderError),
    /// The session's last slot has been observed.
    Finished,
    /// Stop the session.
    Fatal(RuntimeError),
}

/// A unit of work driven by [`crate::run_live_session`]. It is handed its
/// collaborators at construction and owns its state between polls.
#[async_trait]
pub trait ScheduledTask: Send {
    fn name(&self) -> &'static str;

    async fn start(&mut self) -> Result<(), RuntimeError>;

    async fn poll(&mut self, now: NaiveDateTime) -> PollOutcome;

    async fn stop(&mut self);
}

pub struct LivePollTask {
    index: SlotIndex,
    instruments: Vec<String>,
    fetch_limit: usize,
    calendar: Arc<dyn TradingCalendar>,
    fetch: Arc<dyn LiveFetch>,
    events: EventSender,
    aggregate: Option<AggregateResult>,
    tracker: Option<LiveTracker>,
    last: Option<LiveSeries>,
}

impl LivePollTask {
    pub fn new(
        index: SlotIndex,
        instruments: Vec<String>,
        fetch_limit: usize,
        calendar: Arc<dyn TradingCalendar>,
        fetch: Arc<dyn LiveFetch>,
        events: EventSender,
    ) -> Self {
        Self {
            index,
            instruments,
            fetch_limit,
            calendar,
            fetch,
            events,
            aggregate: None,
            tracker: None,
            last: None,
        }
    }

    /// Aggregate published once on `start`, before any live data.
    pub fn with_aggregate(mut self, aggregate: AggregateResult) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn last(&self) -> Option<&LiveSeries> {
        self.last.as_ref()
    }

    fn emit(&self, event: ProfileEvent) {
        // A closed receiver only means nobody is listening any more.
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }

    fn fail(&self, err: RuntimeError) -> PollOutcome {
        self.emit(ProfileEvent::Error {
            message: err.to_string(),
            retryable: err.is_retryable(),
        });
        match err {
            RuntimeError::Provider(e) if e.is_retryable() => {
                warn!(error = %e, "live fetch failed; will retry");
                PollOutcome::Retry(e)
            }
            other => {
                error!(error = %other, "live polling stopped");
                PollOutcome::Fatal(other)
            }
        }
    }
}

#[async_trait]
impl ScheduledTask for LivePollTask {
    fn name(&self) -> &'static str {
        "live-poll"
    }

    async fn start(&mut self) -> Result<(), RuntimeError> {
        let day = self.calendar.latest_trading_day().await?;
        info!(day = %day, instruments = self.instruments.len(), "live session starting");
        self.tracker = Some(LiveTracker::new(self.index.clone(), day));
        self.last = None;
        if let Some(agg) = self.aggregate.clone() {
            self.emit(ProfileEvent::Aggregate(agg));
        }
        Ok(())
    }

    async fn poll(&mut self, now: NaiveDateTime) -> PollOutcome {
        if self.tracker.is_none() {
            return self.fail(
                ivp_engine::EngineError::configuration("live task polled before start").into(),
            );
        }

        let mut batch: Vec<RawSample> = Vec::new();
        for inst in &self.instruments {
            match self.fetch.latest(inst, self.fetch_limit).await {
                Ok(rows) => batch.extend(rows),
                Err(e) => return self.fail(e.into()),
            }
        }

        let Some(tracker) = self.tracker.as_mut() else {
            return PollOutcome::Finished;
        };
        let series = tracker.update(&batch, now.time());
        let finished = self
            .index
            .last()
            .is_some_and(|slot| series.get(slot).is_some());

        let changed = match &self.last {
            Some(prev) => *prev != series,
            None => !series.is_empty(),
        };
        if changed {
            self.emit(ProfileEvent::Live(series.clone()));
            self.last = Some(series.clone());
        }

        if finished {
            info!("final slot observed; live session finished");
            PollOutcome::Finished
        } else if changed {
            PollOutcome::Updated(series)
        } else {
            PollOutcome::Idle
        }
    }

    async fn stop(&mut self) {
        if let Some(t) = self.tracker.take() {
            info!(day = %t.day(), "live session stopped");
        }
    }
}
