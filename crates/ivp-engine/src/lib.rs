//! ivp-engine
//!
//! Sliding multi-day slot aggregation for intraday traded amount.
//!
//! - Slot Index: canonical ordered time-of-day grid (bar end labels)
//! - Daily Series Builder: raw samples -> per-day, per-slot display values
//! - Completeness Checker: observed vs expected slots, backfill signalling
//! - Window Aggregator: FIFO of N days, per-slot average/max/min
//! - Live Merge Tracker: today's values, never past `now`
//!
//! Pure deterministic logic. No IO, no wall-clock. Callers supply days,
//! samples and the current time.

mod completeness;
mod error;
mod live;
mod series;
mod slots;
mod types;
mod window;

pub use completeness::{
    check_completeness, check_instruments, CompletenessGate, CompletenessReport, GateAction,
    GateDecision, InstrumentShortfall,
};
pub use error::{EngineError, ErrorKind};
pub use live::{LiveRow, LiveSeries, LiveTracker};
pub use series::{
    BuildOutput, DailySeries, InstrumentLedger, SeriesBuilder, UnalignedSample,
    DEFAULT_MAX_UNALIGNED,
};
pub use slots::{SessionSegment, Slot, SlotIndex, CN_A_SHARE_SESSIONS};
pub use types::{
    round2, to_display_unit, ParseDayError, RawSample, TradingDay, DISPLAY_UNIT_DIVISOR,
};
pub use window::{
    AggregateResult, AggregateRow, MinPolicy, WindowAggregator, WindowStatus,
    DEFAULT_WINDOW_DAYS,
};
