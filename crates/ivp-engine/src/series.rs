//! Daily Series Builder.
//!
//! Groups raw samples by calendar date, aligns each sample to its canonical
//! slot and sums instruments per slot in the display unit. Values keep full
//! precision; rounding happens only on emitted aggregate/live rows.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::slots::{Slot, SlotIndex};
use crate::types::{to_display_unit, RawSample, TradingDay};

/// Default number of unaligned samples tolerated per build before the feed is
/// treated as misconfigured.
pub const DEFAULT_MAX_UNALIGNED: usize = 8;

// ---------------------------------------------------------------------------
// DailySeries
// ---------------------------------------------------------------------------

/// Ordered slot → value mapping (display unit) for one trading day.
///
/// Holds either a single instrument or a pre-summed multi-instrument total.
/// A series built from samples also records how many slots each instrument
/// reported, so a sum that hides a short instrument can still be caught.
/// Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct DailySeries {
    day: TradingDay,
    points: Vec<(Slot, f64)>,
    coverage: BTreeMap<String, usize>,
}

impl DailySeries {
    /// Build from `(slot, display value)` pairs. Points are sorted by slot; a
    /// repeated slot keeps the last value.
    pub fn new<I>(day: TradingDay, points: I) -> Self
    where
        I: IntoIterator<Item = (Slot, f64)>,
    {
        let map: BTreeMap<Slot, f64> = points.into_iter().collect();
        Self {
            day,
            points: map.into_iter().collect(),
            coverage: BTreeMap::new(),
        }
    }

    pub fn day(&self) -> TradingDay {
        self.day
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(Slot, f64)] {
        &self.points
    }

    pub fn get(&self, slot: Slot) -> Option<f64> {
        self.points
            .binary_search_by(|(s, _)| s.cmp(&slot))
            .ok()
            .map(|i| self.points[i].1)
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.points.iter().map(|(s, _)| *s)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    /// Slots reported per instrument. Empty for a series built from points.
    pub fn coverage(&self) -> &BTreeMap<String, usize> {
        &self.coverage
    }

    /// Slots reported by `instrument`; 0 when it sent nothing.
    pub fn instrument_slots(&self, instrument: &str) -> usize {
        self.coverage.get(instrument).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// InstrumentLedger
// ---------------------------------------------------------------------------

/// Per-slot, per-instrument raw amounts for one day.
///
/// Last write wins per (slot, instrument). A slot total is the sum over the
/// instruments that have reported it; an instrument that has not reported a
/// slot contributes nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentLedger {
    slots: BTreeMap<Slot, BTreeMap<String, f64>>,
}

impl InstrumentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, slot: Slot, instrument: &str, raw_amount: f64) {
        self.slots
            .entry(slot)
            .or_default()
            .insert(instrument.to_string(), raw_amount);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Sum for `slot` in the display unit, if any instrument reported it.
    pub fn total(&self, slot: Slot) -> Option<f64> {
        self.slots
            .get(&slot)
            .map(|per| to_display_unit(per.values().sum()))
    }

    /// Per-instrument values for `slot` in the display unit.
    pub fn instruments(&self, slot: Slot) -> BTreeMap<String, f64> {
        self.slots
            .get(&slot)
            .map(|per| {
                per.iter()
                    .map(|(k, v)| (k.clone(), to_display_unit(*v)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Slots that have at least one value, in slot order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.slots.keys().copied()
    }

    /// Number of slots each instrument has reported.
    pub fn coverage(&self) -> BTreeMap<String, usize> {
        let mut out: BTreeMap<String, usize> = BTreeMap::new();
        for inst in self.slots.values().flat_map(|per| per.keys()) {
            *out.entry(inst.clone()).or_default() += 1;
        }
        out
    }

    pub fn to_series(&self, day: TradingDay) -> DailySeries {
        DailySeries {
            day,
            points: self
                .slots
                .iter()
                .map(|(slot, per)| (*slot, to_display_unit(per.values().sum())))
                .collect(),
            coverage: self.coverage(),
        }
    }
}

// ---------------------------------------------------------------------------
// SeriesBuilder
// ---------------------------------------------------------------------------

/// A sample whose timestamp is not on the canonical grid.
#[derive(Clone, Debug, PartialEq)]
pub struct UnalignedSample {
    pub instrument: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildOutput {
    /// One summed series per day found in the input, oldest first.
    pub series: Vec<DailySeries>,
    /// Samples that were dropped because they did not align to a slot.
    pub dropped: Vec<UnalignedSample>,
}

pub struct SeriesBuilder<'a> {
    index: &'a SlotIndex,
    max_unaligned: usize,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(index: &'a SlotIndex) -> Self {
        Self {
            index,
            max_unaligned: DEFAULT_MAX_UNALIGNED,
        }
    }

    /// Tolerate at most `n` unaligned samples per build.
    pub fn with_max_unaligned(mut self, n: usize) -> Self {
        self.max_unaligned = n;
        self
    }

    /// Group `samples` by day and sum instruments per slot.
    ///
    /// Unaligned samples are dropped and logged. More than `max_unaligned`
    /// of them fails the whole build with `UnalignedSample`.
    pub fn build(&self, samples: &[RawSample]) -> Result<BuildOutput, EngineError> {
        let mut days: BTreeMap<TradingDay, InstrumentLedger> = BTreeMap::new();
        let mut dropped = Vec::new();

        for s in samples {
            match self.index.slot_for(s.timestamp.time()) {
                Some(slot) => days
                    .entry(s.day())
                    .or_default()
                    .record(slot, &s.instrument, s.amount),
                None => {
                    warn!(
                        instrument = %s.instrument,
                        timestamp = %s.timestamp,
                        "dropping sample that does not align to a slot"
                    );
                    dropped.push(UnalignedSample {
                        instrument: s.instrument.clone(),
                        timestamp: s.timestamp,
                    });
                }
            }
        }

        if dropped.len() > self.max_unaligned {
            return Err(EngineError::unaligned_sample(format!(
                "{} samples did not align to the {}-minute slot grid (tolerance {})",
                dropped.len(),
                self.index.interval_minutes(),
                self.max_unaligned
            )));
        }

        let series: Vec<DailySeries> = days
            .iter()
            .map(|(day, ledger)| ledger.to_series(*day))
            .collect();
        debug!(days = series.len(), dropped = dropped.len(), "built daily series");

        Ok(BuildOutput { series, dropped })
    }

    /// Build the series for a single `day`; samples dated elsewhere are ignored.
    pub fn build_day(
        &self,
        day: TradingDay,
        samples: &[RawSample],
    ) -> Result<DailySeries, EngineError> {
        let same_day: Vec<RawSample> = samples.iter().filter(|s| s.day() == day).cloned().collect();
        let out = self.build(&same_day)?;
        Ok(out
            .series
            .into_iter()
            .next()
            .unwrap_or_else(|| DailySeries::new(day, std::iter::empty())))
    }
}
