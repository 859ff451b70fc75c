//! Live Merge Tracker: today's slot values, never ahead of the clock.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::Serialize;
use tracing::{debug, trace};

use crate::series::InstrumentLedger;
use crate::slots::{Slot, SlotIndex};
use crate::types::{round2, RawSample, TradingDay};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LiveRow {
    pub slot: Slot,
    /// Sum over the instruments that have reported this slot.
    pub total: f64,
    pub instruments: BTreeMap<String, f64>,
}

/// Snapshot of today's series. Values in the display unit, 2 decimals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LiveSeries {
    pub day: TradingDay,
    pub rows: Vec<LiveRow>,
}

impl LiveSeries {
    pub fn get(&self, slot: Slot) -> Option<&LiveRow> {
        self.rows.iter().find(|r| r.slot == slot)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_slot(&self) -> Option<Slot> {
        self.rows.last().map(|r| r.slot)
    }
}

/// Owns the live series for one trading day. Recreated per session.
#[derive(Clone, Debug)]
pub struct LiveTracker {
    index: SlotIndex,
    day: TradingDay,
    ledger: InstrumentLedger,
    as_of: Option<NaiveTime>,
}

impl LiveTracker {
    pub fn new(index: SlotIndex, day: TradingDay) -> Self {
        Self {
            index,
            day,
            ledger: InstrumentLedger::new(),
            as_of: None,
        }
    }

    /// Start a fresh series for `day`.
    pub fn reset(&mut self, day: TradingDay) {
        debug!(from = %self.day, to = %day, "live tracker reset");
        self.day = day;
        self.ledger = InstrumentLedger::new();
        self.as_of = None;
    }

    pub fn day(&self) -> TradingDay {
        self.day
    }

    pub fn index(&self) -> &SlotIndex {
        &self.index
    }

    /// Latest clock passed to `update`. Kept out of [`LiveSeries`] so an
    /// update with nothing new returns an equal series.
    pub fn as_of(&self) -> Option<NaiveTime> {
        self.as_of
    }

    /// Merge fresh samples and return the series as of `now`.
    ///
    /// Samples from another day, off the grid, or whose slot ends after `now`
    /// are skipped. Feeding the same samples twice yields the same series.
    pub fn update(&mut self, samples: &[RawSample], now: NaiveTime) -> LiveSeries {
        let mut written = 0usize;
        for s in samples {
            if s.day() != self.day {
                trace!(instrument = %s.instrument, timestamp = %s.timestamp, "skipping sample from another day");
                continue;
            }
            let Some(slot) = self.index.slot_for(s.timestamp.time()) else {
                trace!(instrument = %s.instrument, timestamp = %s.timestamp, "skipping unaligned live sample");
                continue;
            };
            if slot.is_after(now) {
                continue;
            }
            self.ledger.record(slot, &s.instrument, s.amount);
            written += 1;
        }

        self.as_of = Some(match self.as_of {
            Some(prev) if prev > now => prev,
            _ => now,
        });
        debug!(day = %self.day, written, now = %now, "live series updated");

        self.snapshot()
    }

    /// Current series without merging anything.
    pub fn snapshot(&self) -> LiveSeries {
        let rows = self
            .ledger
            .slots()
            .filter(|slot| self.as_of.map_or(true, |t| !slot.is_after(t)))
            .map(|slot| {
                let total = self.ledger.total(slot).unwrap_or(0.0);
                LiveRow {
                    slot,
                    total: round2(total),
                    instruments: self
                        .ledger
                        .instruments(slot)
                        .into_iter()
                        .map(|(k, v)| (k, round2(v)))
                        .collect(),
                }
            })
            .collect();

        LiveSeries {
            day: self.day,
            rows,
        }
    }
}
