//! In-memory provider for tests and offline runs.
//!
//! Holds history and live samples per instrument. `backfill` records the
//! request and promotes any staged repair samples for that day, so a later
//! `fetch` returns the repaired day. Failures can be queued to exercise retry
//! paths.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ivp_engine::{RawSample, TradingDay};
use tracing::debug;

use crate::provider::{HistoricalFetch, LiveFetch, ProviderError};

#[derive(Debug, Default)]
struct FixtureState {
    history: BTreeMap<String, Vec<RawSample>>,
    repairs: BTreeMap<(String, TradingDay), Vec<RawSample>>,
    live: BTreeMap<String, Vec<RawSample>>,
    backfill_requests: Vec<(String, TradingDay)>,
    failures: VecDeque<ProviderError>,
    fetch_calls: usize,
    latest_calls: usize,
}

#[derive(Debug, Default)]
pub struct FixtureProvider {
    state: Mutex<FixtureState>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add history samples; they are grouped by their instrument.
    pub fn with_history<I: IntoIterator<Item = RawSample>>(self, samples: I) -> Self {
        self.add_history(samples);
        self
    }

    pub fn add_history<I: IntoIterator<Item = RawSample>>(&self, samples: I) {
        let mut st = self.state();
        for s in samples {
            st.history.entry(s.instrument.clone()).or_default().push(s);
        }
    }

    /// Stage samples that replace `instrument`'s data for `day` once a
    /// backfill for that day is requested.
    pub fn stage_repair<I: IntoIterator<Item = RawSample>>(
        &self,
        instrument: &str,
        day: TradingDay,
        samples: I,
    ) {
        self.state()
            .repairs
            .insert((instrument.to_string(), day), samples.into_iter().collect());
    }

    /// Replace today's samples for `instrument`.
    pub fn set_live<I: IntoIterator<Item = RawSample>>(&self, instrument: &str, samples: I) {
        self.state()
            .live
            .insert(instrument.to_string(), samples.into_iter().collect());
    }

    /// The next fetch-type call (history or live) fails with `err`.
    pub fn inject_failure(&self, err: ProviderError) {
        self.state().failures.push_back(err);
    }

    pub fn backfill_requests(&self) -> Vec<(String, TradingDay)> {
        self.state().backfill_requests.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    pub fn latest_calls(&self) -> usize {
        self.state().latest_calls
    }
}

#[async_trait]
impl HistoricalFetch for FixtureProvider {
    fn source_name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch(
        &self,
        instrument: &str,
        _interval_minutes: u16,
        start: TradingDay,
        end: TradingDay,
    ) -> Result<Vec<RawSample>, ProviderError> {
        let mut st = self.state();
        st.fetch_calls += 1;
        if let Some(err) = st.failures.pop_front() {
            return Err(err);
        }
        let mut out: Vec<RawSample> = st
            .history
            .get(instrument)
            .map(|v| {
                v.iter()
                    .filter(|s| s.day() >= start && s.day() <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by_key(|s| s.timestamp);
        Ok(out)
    }

    async fn backfill(
        &self,
        instrument: &str,
        _interval_minutes: u16,
        day: TradingDay,
    ) -> Result<(), ProviderError> {
        let mut st = self.state();
        st.backfill_requests.push((instrument.to_string(), day));
        if let Some(repair) = st.repairs.remove(&(instrument.to_string(), day)) {
            debug!(instrument, day = %day, samples = repair.len(), "fixture backfill promoted");
            let rows = st.history.entry(instrument.to_string()).or_default();
            rows.retain(|s| s.day() != day);
            rows.extend(repair);
        }
        Ok(())
    }
}

#[async_trait]
impl LiveFetch for FixtureProvider {
    async fn latest(
        &self,
        instrument: &str,
        limit: usize,
    ) -> Result<Vec<RawSample>, ProviderError> {
        let mut st = self.state();
        st.latest_calls += 1;
        if let Some(err) = st.failures.pop_front() {
            return Err(err);
        }
        let mut rows = st.live.get(instrument).cloned().unwrap_or_default();
        rows.sort_by_key(|s| s.timestamp);
        let skip = rows.len().saturating_sub(limit);
        Ok(rows.split_off(skip))
    }
}
