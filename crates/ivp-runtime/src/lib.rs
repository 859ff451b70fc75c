//! ivp-runtime
//!
//! Wires the engine to its collaborators:
//! - history bootstrap: calendar → fetch → build → completeness/backfill → window
//! - live polling: a schedulable task over `LiveFetch` + `LiveTracker`
//! - refresh schedule: one poll per slot end plus a small lag
//! - events: typed results pushed through a tokio channel
//!
//! The engine stays pure; every await, sleep and clock read happens here.

mod bootstrap;
mod error;
mod events;
mod schedule;
mod session;
mod task;

pub use bootstrap::{bootstrap_history, HistoryOutcome};
pub use error::RuntimeError;
pub use events::{event_channel, EventReceiver, EventSender, ProfileEvent};
pub use schedule::{next_refresh_after, refresh_points};
pub use session::{run_live_session, Clock, ManualClock, SessionEnd, SessionSummary, SystemClock};
pub use task::{LivePollTask, PollOutcome, ScheduledTask};
