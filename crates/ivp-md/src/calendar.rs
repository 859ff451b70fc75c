//! In-process trading calendar backed by an explicit day list.

use async_trait::async_trait;
use ivp_engine::TradingDay;

use crate::provider::{ProviderError, TradingCalendar};

/// Calendar over a fixed list of trading days.
///
/// The newest listed day is "latest" (today). `previous_trading_days(n)` is
/// the `n` days before it, so a list must hold at least `n + 1` days.
#[derive(Clone, Debug, Default)]
pub struct StaticCalendar {
    days: Vec<TradingDay>,
}

impl StaticCalendar {
    /// Days are sorted and de-duplicated.
    pub fn new<I: IntoIterator<Item = TradingDay>>(days: I) -> Self {
        let mut days: Vec<TradingDay> = days.into_iter().collect();
        days.sort();
        days.dedup();
        Self { days }
    }

    /// Build from `YYYYMMDD` labels.
    pub fn from_labels(labels: &[&str]) -> Result<Self, ProviderError> {
        let days = labels
            .iter()
            .map(|l| {
                l.parse::<TradingDay>()
                    .map_err(|e| ProviderError::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(days))
    }

    pub fn days(&self) -> &[TradingDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[async_trait]
impl TradingCalendar for StaticCalendar {
    async fn previous_trading_days(&self, n: usize) -> Result<Vec<TradingDay>, ProviderError> {
        if self.days.len() < n + 1 {
            return Err(ProviderError::CalendarUnavailable(format!(
                "need {} trading days before today, calendar knows {}",
                n,
                self.days.len().saturating_sub(1)
            )));
        }
        let end = self.days.len() - 1;
        Ok(self.days[end - n..end].to_vec())
    }

    async fn latest_trading_day(&self) -> Result<TradingDay, ProviderError> {
        self.days
            .last()
            .copied()
            .ok_or_else(|| ProviderError::CalendarUnavailable("calendar is empty".to_string()))
    }
}
