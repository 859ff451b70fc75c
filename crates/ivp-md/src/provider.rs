//! Collaborator contracts for calendar, history and live data.
//!
//! This module defines **only** the traits and the error type. Concrete
//! implementations live in [`crate::calendar`] and [`crate::fixture`]; a
//! network client would implement the same traits.

use std::fmt;

use async_trait::async_trait;
use ivp_engine::{RawSample, TradingDay};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that a collaborator implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API returned an application-level error.
    Api { code: Option<i64>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// A required configuration value is missing or invalid.
    Config(String),
    /// The trading calendar could not resolve the requested days.
    CalendarUnavailable(String),
}

impl ProviderError {
    /// Transient failures: the caller should keep polling and try again.
    ///
    /// Configuration and calendar failures are not retryable; they end the
    /// session.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport(_) | ProviderError::Api { .. } | ProviderError::Decode(_)
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Api {
                code: Some(c),
                message,
            } => {
                write!(f, "provider api error code={c}: {message}")
            }
            ProviderError::Api {
                code: None,
                message,
            } => {
                write!(f, "provider api error: {message}")
            }
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::CalendarUnavailable(msg) => write!(f, "calendar unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Trading-day resolution. The engine never decides which dates trade.
#[async_trait]
pub trait TradingCalendar: Send + Sync {
    /// The `n` trading days before the latest one, oldest first. Exactly `n`
    /// entries or `CalendarUnavailable`.
    async fn previous_trading_days(&self, n: usize) -> Result<Vec<TradingDay>, ProviderError>;

    /// The current (most recent) trading day.
    async fn latest_trading_day(&self) -> Result<TradingDay, ProviderError>;
}

/// Historical fixed-interval samples.
#[async_trait]
pub trait HistoricalFetch: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// All samples for `instrument` between `start` and `end`, both inclusive.
    async fn fetch(
        &self,
        instrument: &str,
        interval_minutes: u16,
        start: TradingDay,
        end: TradingDay,
    ) -> Result<Vec<RawSample>, ProviderError>;

    /// Ask the source to re-acquire `day`. Fire-and-forget: `Ok` only means the
    /// request was accepted; the caller re-fetches to see the result.
    async fn backfill(
        &self,
        instrument: &str,
        interval_minutes: u16,
        day: TradingDay,
    ) -> Result<(), ProviderError>;
}

/// Today's samples, most recent last.
#[async_trait]
pub trait LiveFetch: Send + Sync {
    async fn latest(&self, instrument: &str, limit: usize)
        -> Result<Vec<RawSample>, ProviderError>;
}
