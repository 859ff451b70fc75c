//! Window Aggregator: FIFO of the last N complete days and their per-slot
//! average/max/min.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::series::DailySeries;
use crate::slots::{Slot, SlotIndex};
use crate::types::{round2, TradingDay};

pub const DEFAULT_WINDOW_DAYS: usize = 5;

// ---------------------------------------------------------------------------
// Min policy
// ---------------------------------------------------------------------------

/// How the per-slot minimum is reduced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinPolicy {
    /// Start at 0 and replace when `v < min || min == 0`.
    ///
    /// 0 means "unset": a zero is replaced by the next value and is only
    /// reported when it comes last (`[5, 0, 3]` gives 3, `[5, 3, 0]` gives 0).
    #[default]
    ZeroSentinel,
    /// Conventional minimum over all values.
    Strict,
}

impl MinPolicy {
    pub fn reduce<I: IntoIterator<Item = f64>>(&self, values: I) -> f64 {
        match self {
            MinPolicy::ZeroSentinel => {
                let mut min = 0.0;
                for v in values {
                    if v < min || min == 0.0 {
                        min = v;
                    }
                }
                min
            }
            MinPolicy::Strict => values.into_iter().reduce(f64::min).unwrap_or(0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MinPolicy::ZeroSentinel => "zero_sentinel",
            MinPolicy::Strict => "strict",
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateRow {
    pub slot: Slot,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// One row per slot, in grid order. Never partial.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateResult {
    /// Window days, oldest first.
    pub days: Vec<TradingDay>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateResult {
    /// Newest day in the window.
    pub fn as_of(&self) -> Option<TradingDay> {
        self.days.last().copied()
    }

    pub fn row(&self, slot: Slot) -> Option<&AggregateRow> {
        self.rows.iter().find(|r| r.slot == slot)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WindowStatus {
    Ready(AggregateResult),
    /// Fewer than `required` days held. An expected state, not an error.
    NotReady { held: usize, required: usize },
}

impl WindowStatus {
    pub fn ready(&self) -> Option<&AggregateResult> {
        match self {
            WindowStatus::Ready(r) => Some(r),
            WindowStatus::NotReady { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, WindowStatus::Ready(_))
    }
}

// ---------------------------------------------------------------------------
// WindowAggregator
// ---------------------------------------------------------------------------

/// Owns the window exclusively. Single writer; no internal locking.
#[derive(Clone, Debug)]
pub struct WindowAggregator {
    slots: Vec<Slot>,
    capacity: usize,
    policy: MinPolicy,
    days: VecDeque<DailySeries>,
    current: Option<AggregateResult>,
}

impl WindowAggregator {
    pub fn new(index: &SlotIndex, capacity: usize) -> Result<Self, EngineError> {
        if capacity == 0 {
            return Err(EngineError::configuration("window must hold at least one day"));
        }
        Ok(Self {
            slots: index.slots().to_vec(),
            capacity,
            policy: MinPolicy::default(),
            days: VecDeque::with_capacity(capacity + 1),
            current: None,
        })
    }

    pub fn with_policy(mut self, policy: MinPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MinPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.days.len() == self.capacity
    }

    /// Days currently held, oldest first.
    pub fn days(&self) -> Vec<TradingDay> {
        self.days.iter().map(DailySeries::day).collect()
    }

    /// Append one complete day.
    ///
    /// The series must carry exactly the grid's slots in grid order, otherwise
    /// `SlotMismatch` is returned and the window is left as it was. Days must
    /// arrive in strictly increasing order.
    pub fn append(&mut self, series: DailySeries) -> Result<WindowStatus, EngineError> {
        self.check_alignment(&series)?;

        debug_assert!(
            self.days.back().map_or(true, |last| last.day() < series.day()),
            "window append out of order: {} after {:?}",
            series.day(),
            self.days.back().map(DailySeries::day)
        );

        self.days.push_back(series);
        if self.days.len() > self.capacity {
            if let Some(evicted) = self.days.pop_front() {
                debug!(day = %evicted.day(), "evicted oldest day from window");
            }
        }

        if self.is_ready() {
            let result = self.recompute();
            info!(
                as_of = ?result.as_of().map(|d| d.to_string()),
                days = self.days.len(),
                "window aggregate recomputed"
            );
            self.current = Some(result);
        }

        Ok(self.current())
    }

    /// Latest aggregate, or `NotReady` while fewer than N days are held.
    pub fn current(&self) -> WindowStatus {
        match &self.current {
            Some(r) if self.is_ready() => WindowStatus::Ready(r.clone()),
            _ => WindowStatus::NotReady {
                held: self.days.len(),
                required: self.capacity,
            },
        }
    }

    fn check_alignment(&self, series: &DailySeries) -> Result<(), EngineError> {
        if series.len() != self.slots.len() {
            return Err(EngineError::slot_mismatch(format!(
                "day {} has {} slots, expected {}",
                series.day(),
                series.len(),
                self.slots.len()
            )));
        }
        if let Some((got, want)) = series
            .slots()
            .zip(self.slots.iter().copied())
            .find(|(got, want)| got != want)
        {
            return Err(EngineError::slot_mismatch(format!(
                "day {} has slot {got} where {want} was expected",
                series.day()
            )));
        }
        Ok(())
    }

    // Alignment was checked on append, so position k is slot k for every day.
    fn column(&self, k: usize) -> impl Iterator<Item = f64> + '_ {
        self.days.iter().map(move |d| d.points()[k].1)
    }

    fn recompute(&self) -> AggregateResult {
        let n = self.days.len() as f64;
        let rows = self
            .slots
            .iter()
            .enumerate()
            .map(|(k, slot)| {
                let sum: f64 = self.column(k).sum();
                let max = self.column(k).fold(0.0, |m, v| if v > m { v } else { m });
                let min = self.policy.reduce(self.column(k));
                AggregateRow {
                    slot: *slot,
                    average: round2(sum / n),
                    max: round2(max),
                    min: round2(min),
                }
            })
            .collect();

        AggregateResult {
            days: self.days(),
            rows,
        }
    }
}
