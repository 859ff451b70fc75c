//! Completeness Checker.
//!
//! Compares a day's observed slot coverage against the grid. The checker only
//! signals; issuing the backfill belongs to the runtime.

use std::collections::BTreeMap;

use tracing::warn;

use crate::series::DailySeries;
use crate::slots::{Slot, SlotIndex};
use crate::types::TradingDay;

/// An instrument that reported fewer slots than the grid holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentShortfall {
    pub instrument: String,
    pub observed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletenessReport {
    pub day: TradingDay,
    /// Slots of the summed series.
    pub observed: usize,
    pub expected: usize,
    /// Canonical slots with no value, in grid order.
    pub missing: Vec<Slot>,
    /// Instruments short on their own, even where the sum looks full.
    pub short_instruments: Vec<InstrumentShortfall>,
}

impl CompletenessReport {
    pub fn is_incomplete(&self) -> bool {
        self.observed < self.expected || !self.short_instruments.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.is_incomplete()
    }

    /// Instruments to backfill. Every expected one when none is singled out.
    pub fn instruments_to_backfill<'a>(&'a self, expected: &'a [String]) -> Vec<&'a str> {
        if self.short_instruments.is_empty() {
            expected.iter().map(String::as_str).collect()
        } else {
            self.short_instruments
                .iter()
                .map(|s| s.instrument.as_str())
                .collect()
        }
    }
}

/// Check the summed series only. Only canonical slots count towards
/// `observed`.
pub fn check_completeness(series: &DailySeries, index: &SlotIndex) -> CompletenessReport {
    check_instruments(series, index, &[])
}

/// Check the summed series and every instrument in `instruments` on its own.
/// An instrument absent from the day counts as 0 slots.
pub fn check_instruments(
    series: &DailySeries,
    index: &SlotIndex,
    instruments: &[String],
) -> CompletenessReport {
    let missing: Vec<Slot> = index
        .slots()
        .iter()
        .copied()
        .filter(|s| series.get(*s).is_none())
        .collect();
    let expected = index.expected_count();
    let short_instruments = instruments
        .iter()
        .map(|inst| InstrumentShortfall {
            instrument: inst.clone(),
            observed: series.instrument_slots(inst),
        })
        .filter(|s| s.observed < expected)
        .collect();
    CompletenessReport {
        day: series.day(),
        observed: expected - missing.len(),
        expected,
        missing,
        short_instruments,
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateAction {
    /// Complete; may be appended to the window.
    Admit,
    /// Incomplete; request a backfill and re-check.
    Backfill,
    /// Still incomplete after every allowed backfill; never appended.
    Exclude,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateDecision {
    pub action: GateAction,
    pub report: CompletenessReport,
    /// Backfills already requested for this day, including this one.
    pub attempt: u32,
}

/// Tracks backfill attempts per day and turns reports into decisions.
#[derive(Clone, Debug)]
pub struct CompletenessGate {
    max_backfill_attempts: u32,
    instruments: Vec<String>,
    attempts: BTreeMap<TradingDay, u32>,
}

impl CompletenessGate {
    pub fn new(max_backfill_attempts: u32) -> Self {
        Self {
            max_backfill_attempts,
            instruments: Vec::new(),
            attempts: BTreeMap::new(),
        }
    }

    /// Require each of `instruments` to cover the grid on its own.
    pub fn with_instruments(mut self, instruments: Vec<String>) -> Self {
        self.instruments = instruments;
        self
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn max_backfill_attempts(&self) -> u32 {
        self.max_backfill_attempts
    }

    pub fn attempts(&self, day: TradingDay) -> u32 {
        self.attempts.get(&day).copied().unwrap_or(0)
    }

    pub fn evaluate(&mut self, series: &DailySeries, index: &SlotIndex) -> GateDecision {
        let report = check_instruments(series, index, &self.instruments);
        let day = report.day;

        if report.is_complete() {
            return GateDecision {
                action: GateAction::Admit,
                attempt: self.attempts(day),
                report,
            };
        }

        let used = self.attempts(day);
        if used >= self.max_backfill_attempts {
            warn!(
                day = %day,
                observed = report.observed,
                expected = report.expected,
                attempts = used,
                short = report.short_instruments.len(),
                "day still incomplete after backfill; excluding"
            );
            return GateDecision {
                action: GateAction::Exclude,
                attempt: used,
                report,
            };
        }

        let attempt = used + 1;
        self.attempts.insert(day, attempt);
        warn!(
            day = %day,
            observed = report.observed,
            expected = report.expected,
            attempt,
            short = report.short_instruments.len(),
            "incomplete day; backfill requested"
        );
        GateDecision {
            action: GateAction::Backfill,
            attempt,
            report,
        }
    }
}
