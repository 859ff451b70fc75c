use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Display unit
// ---------------------------------------------------------------------------

/// Raw currency amounts are divided by this before anything is emitted
/// (1 display unit = 10^8 currency units).
pub const DISPLAY_UNIT_DIVISOR: f64 = 100_000_000.0;

/// Convert a raw currency amount into the display unit. Full precision.
pub fn to_display_unit(raw_amount: f64) -> f64 {
    raw_amount / DISPLAY_UNIT_DIVISOR
}

/// Round to 2 decimal places, exact ties to even (0.125 -> 0.12).
///
/// Applied only to emitted values; internal sums keep full precision.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

// ---------------------------------------------------------------------------
// TradingDay
// ---------------------------------------------------------------------------

/// A trading date, rendered as `YYYYMMDD`.
///
/// Always supplied by a calendar collaborator or derived from a sample
/// timestamp; the engine never computes which days are trading days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDay(NaiveDate);

impl TradingDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Compact label, e.g. `20250108`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl From<NaiveDate> for TradingDay {
    fn from(d: NaiveDate) -> Self {
        Self(d)
    }
}

impl fmt::Display for TradingDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

/// Returned when a `YYYYMMDD` label cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDayError(pub String);

impl fmt::Display for ParseDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid trading day '{}': expected YYYYMMDD", self.0)
    }
}

impl std::error::Error for ParseDayError {}

impl FromStr for TradingDay {
    type Err = ParseDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let err = || ParseDayError(t.to_string());
        if t.len() != 8 || !t.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let year: i32 = t[0..4].parse().map_err(|_| err())?;
        let month: u32 = t[4..6].parse().map_err(|_| err())?;
        let day: u32 = t[6..8].parse().map_err(|_| err())?;
        TradingDay::from_ymd(year, month, day).ok_or_else(err)
    }
}

impl Serialize for TradingDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Raw sample
// ---------------------------------------------------------------------------

/// One fixed-interval traded-amount sample as delivered by a fetch
/// collaborator.
///
/// `timestamp` is the bar end in exchange-local time; `amount` is in raw
/// currency units (not yet divided into the display unit).
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    pub instrument: String,
    pub timestamp: NaiveDateTime,
    pub amount: f64,
}

impl RawSample {
    pub fn new<S: Into<String>>(instrument: S, timestamp: NaiveDateTime, amount: f64) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            amount,
        }
    }

    pub fn day(&self) -> TradingDay {
        TradingDay(self.timestamp.date())
    }
}
