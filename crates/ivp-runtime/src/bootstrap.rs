//! History bootstrap: fill the window with the previous N trading days.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use ivp_config::ProfileConfig;
use ivp_engine::{
    CompletenessGate, CompletenessReport, DailySeries, GateAction, RawSample, SeriesBuilder,
    SlotIndex, TradingDay, WindowAggregator, WindowStatus,
};
use ivp_md::{HistoricalFetch, TradingCalendar};

use crate::error::RuntimeError;

#[derive(Debug)]
pub struct HistoryOutcome {
    /// Days the calendar returned, oldest first.
    pub requested: Vec<TradingDay>,
    /// Final completeness report per requested day.
    pub reports: Vec<CompletenessReport>,
    /// Days that stayed incomplete after every backfill.
    pub excluded: Vec<TradingDay>,
    pub status: WindowStatus,
    /// The populated window, ready for further appends.
    pub window: WindowAggregator,
}

/// Resolve the previous N trading days, fetch every configured instrument,
/// gate each day on completeness (with backfill) and append the survivors.
///
/// A calendar failure is fatal. A fetch failure is returned as is; callers
/// decide whether to retry from [`RuntimeError::is_retryable`].
pub async fn bootstrap_history(
    cfg: &ProfileConfig,
    calendar: &dyn TradingCalendar,
    fetch: &dyn HistoricalFetch,
) -> Result<HistoryOutcome, RuntimeError> {
    let index = cfg.slot_index()?;
    let n = cfg.window_days();

    let requested = calendar.previous_trading_days(n).await.map_err(|e| {
        error!(error = %e, "trading calendar unavailable; stopping");
        RuntimeError::from(e)
    })?;
    let (Some(&start), Some(&end)) = (requested.first(), requested.last()) else {
        return Err(ivp_engine::EngineError::calendar_unavailable(
            "calendar returned no trading days",
        )
        .into());
    };
    info!(
        source = fetch.source_name(),
        start = %start,
        end = %end,
        days = requested.len(),
        "bootstrapping history"
    );

    let mut samples: Vec<RawSample> = Vec::new();
    for inst in &cfg.ingest.instruments {
        let rows = fetch
            .fetch(inst, index.interval_minutes(), start, end)
            .await
            .map_err(|e| {
                warn!(instrument = %inst, error = %e, retryable = e.is_retryable(), "history fetch failed");
                RuntimeError::from(e)
            })?;
        samples.extend(rows);
    }

    let builder =
        SeriesBuilder::new(&index).with_max_unaligned(cfg.ingest.max_unaligned_samples);
    let mut by_day: BTreeMap<TradingDay, DailySeries> = builder
        .build(&samples)?
        .series
        .into_iter()
        .map(|s| (s.day(), s))
        .collect();

    let mut gate = CompletenessGate::new(cfg.ingest.max_backfill_attempts)
        .with_instruments(cfg.ingest.instruments.clone());
    let mut window = WindowAggregator::new(&index, n)?.with_policy(cfg.min_policy());
    let mut reports = Vec::with_capacity(requested.len());
    let mut excluded = Vec::new();

    for day in &requested {
        let mut series = by_day
            .remove(day)
            .unwrap_or_else(|| DailySeries::new(*day, std::iter::empty()));

        loop {
            let decision = gate.evaluate(&series, &index);
            match decision.action {
                GateAction::Admit => {
                    reports.push(decision.report);
                    window.append(series)?;
                    break;
                }
                GateAction::Exclude => {
                    reports.push(decision.report);
                    excluded.push(*day);
                    break;
                }
                GateAction::Backfill => {
                    let short = decision.report.instruments_to_backfill(gate.instruments());
                    series =
                        backfill_and_refetch(cfg, &index, &builder, fetch, *day, &short).await?;
                }
            }
        }
    }

    let status = window.current();
    info!(
        held = window.len(),
        required = n,
        excluded = excluded.len(),
        ready = status.is_ready(),
        "history bootstrap finished"
    );

    Ok(HistoryOutcome {
        requested,
        reports,
        excluded,
        status,
        window,
    })
}

/// Backfill the `short` instruments, then refetch the whole day so the sum is
/// rebuilt from every instrument.
async fn backfill_and_refetch(
    cfg: &ProfileConfig,
    index: &SlotIndex,
    builder: &SeriesBuilder<'_>,
    fetch: &dyn HistoricalFetch,
    day: TradingDay,
    short: &[&str],
) -> Result<DailySeries, RuntimeError> {
    for &inst in short {
        if let Err(e) = fetch.backfill(inst, index.interval_minutes(), day).await {
            if !e.is_retryable() {
                return Err(e.into());
            }
            warn!(instrument = %inst, day = %day, error = %e, "backfill request failed");
        }
    }

    let mut samples = Vec::new();
    for inst in &cfg.ingest.instruments {
        samples.extend(fetch.fetch(inst, index.interval_minutes(), day, day).await?);
    }
    Ok(builder.build_day(day, &samples)?)
}
