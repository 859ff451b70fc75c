//! Slot Index: the canonical intraday grid.
//!
//! A slot is labelled by its bar **end** time. For a 5-minute grid over
//! 09:30–11:30 and 13:00–15:00 the labels run 09:35 … 11:30, 13:05 … 15:00
//! (48 slots). Every daily series, the N-day window and the live overlay share
//! this one ordered sequence.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use crate::error::EngineError;

const MINUTES_PER_DAY: u16 = 24 * 60;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A time-of-day label with minute resolution (`HH:MM`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    minute_of_day: u16,
}

impl Slot {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self {
            minute_of_day: (hour * 60 + minute) as u16,
        })
    }

    /// Slot label for a wall-clock time. Seconds are truncated, so a bar
    /// stamped `09:35:00` or `09:35:01` both land on `09:35`.
    pub fn from_time(t: NaiveTime) -> Self {
        Self {
            minute_of_day: (t.hour() * 60 + t.minute()) as u16,
        }
    }

    pub fn minute_of_day(&self) -> u16 {
        self.minute_of_day
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.minute_of_day / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minute_of_day % 60)
    }

    /// The slot boundary as a time (`HH:MM:00`).
    pub fn as_time(&self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(u32::from(self.minute_of_day) * 60, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// `true` when the slot closes strictly after `now`.
    pub fn is_after(&self, now: NaiveTime) -> bool {
        self.as_time() > now
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for Slot {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let bad = || EngineError::configuration(format!("invalid slot label '{t}': expected HH:MM"));
        let (h, m) = t.split_once(':').ok_or_else(bad)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(bad());
        }
        let hour: u32 = h.parse().map_err(|_| bad())?;
        let minute: u32 = m.parse().map_err(|_| bad())?;
        Slot::from_hm(hour, minute).ok_or_else(bad)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Session segments
// ---------------------------------------------------------------------------

/// One contiguous trading segment, `[open, close]`, in minutes of day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSegment {
    pub open: u16,
    pub close: u16,
}

impl SessionSegment {
    pub const fn hm(open: (u16, u16), close: (u16, u16)) -> Self {
        Self {
            open: open.0 * 60 + open.1,
            close: close.0 * 60 + close.1,
        }
    }

    /// Parse `"09:30"` / `"11:30"` style boundaries.
    pub fn parse(open: &str, close: &str) -> Result<Self, EngineError> {
        let open: Slot = open.parse()?;
        let close: Slot = close.parse()?;
        Ok(Self {
            open: open.minute_of_day(),
            close: close.minute_of_day(),
        })
    }

    pub fn len_minutes(&self) -> u16 {
        self.close.saturating_sub(self.open)
    }
}

/// Morning and afternoon sessions of the Shanghai / Shenzhen exchanges.
pub const CN_A_SHARE_SESSIONS: [SessionSegment; 2] = [
    SessionSegment::hm((9, 30), (11, 30)),
    SessionSegment::hm((13, 0), (15, 0)),
];

// ---------------------------------------------------------------------------
// SlotIndex
// ---------------------------------------------------------------------------

/// The ordered, fixed-cardinality slot sequence for one session layout.
///
/// Pure and immutable after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotIndex {
    interval_minutes: u16,
    segments: Vec<SessionSegment>,
    slots: Vec<Slot>,
}

impl SlotIndex {
    /// Build the grid.
    ///
    /// Fails with `ConfigurationError` when the interval is zero, a segment is
    /// empty or inverted, segments overlap or are out of order, or the
    /// interval does not evenly divide a segment.
    pub fn new(interval_minutes: u16, segments: &[SessionSegment]) -> Result<Self, EngineError> {
        if interval_minutes == 0 {
            return Err(EngineError::configuration("slot interval must be > 0 minutes"));
        }
        if segments.is_empty() {
            return Err(EngineError::configuration(
                "at least one session segment is required",
            ));
        }

        let mut prev_close: Option<u16> = None;
        for (i, seg) in segments.iter().enumerate() {
            if seg.close > MINUTES_PER_DAY || seg.open >= seg.close {
                return Err(EngineError::configuration(format!(
                    "session segment #{i} is empty or inverted ({}..{})",
                    seg.open, seg.close
                )));
            }
            if let Some(pc) = prev_close {
                if seg.open < pc {
                    return Err(EngineError::configuration(format!(
                        "session segment #{i} overlaps or precedes the previous segment"
                    )));
                }
            }
            if seg.len_minutes() % interval_minutes != 0 {
                return Err(EngineError::configuration(format!(
                    "interval {interval_minutes}m does not evenly divide session segment #{i} \
                     ({} minutes)",
                    seg.len_minutes()
                )));
            }
            prev_close = Some(seg.close);
        }

        Ok(Self::build(interval_minutes, segments))
    }

    /// 5-minute grid over the A-share sessions (48 slots).
    pub fn cn_a_share_5m() -> Self {
        Self::build(5, &CN_A_SHARE_SESSIONS)
    }

    // Callers guarantee the layout was validated.
    fn build(interval_minutes: u16, segments: &[SessionSegment]) -> Self {
        let mut slots = Vec::new();
        for seg in segments {
            let mut end = seg.open + interval_minutes;
            while end <= seg.close {
                slots.push(Slot { minute_of_day: end });
                end += interval_minutes;
            }
        }
        Self {
            interval_minutes,
            segments: segments.to_vec(),
            slots,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn expected_count(&self) -> usize {
        self.slots.len()
    }

    pub fn interval_minutes(&self) -> u16 {
        self.interval_minutes
    }

    pub fn segments(&self) -> &[SessionSegment] {
        &self.segments
    }

    /// Position of `slot` in the grid, or `None` if it is not canonical.
    pub fn index_of(&self, slot: Slot) -> Option<usize> {
        self.slots.binary_search(&slot).ok()
    }

    /// Canonical slot for a bar timestamp, if any.
    pub fn slot_for(&self, t: NaiveTime) -> Option<Slot> {
        let slot = Slot::from_time(t);
        self.index_of(slot).map(|_| slot)
    }

    /// Last slot of the session.
    pub fn last(&self) -> Option<Slot> {
        self.slots.last().copied()
    }
}
