use serde::Serialize;
use tokio::sync::mpsc;

use ivp_engine::{AggregateResult, LiveSeries};

/// What consumers (a chart, a log sink) receive from the runtime.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileEvent {
    Aggregate(AggregateResult),
    Live(LiveSeries),
    Error { message: String, retryable: bool },
}

pub type EventSender = mpsc::UnboundedSender<ProfileEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ProfileEvent>;

/// Single producer per session; sends never block the poll loop.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
