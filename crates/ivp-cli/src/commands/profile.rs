//! `ivp profile`: history CSV in, N-day aggregate out.

use anyhow::{Context, Result};
use ivp_config::ConfigMode;
use ivp_engine::{CompletenessGate, GateAction, SeriesBuilder, WindowAggregator, WindowStatus};
use tracing::warn;

use super::{load_config, load_samples};

/// Every day in the file is checked, the sum and each configured instrument;
/// an incomplete day is excluded (a file has nothing to backfill from).
/// Complete days enter the window oldest first.
pub fn run(config_paths: &[String], csv: &str) -> Result<()> {
    let cfg = load_config(config_paths, ConfigMode::Profile)?;
    let index = cfg.slot_index()?;
    let samples = load_samples(csv, &cfg)?;

    let built = SeriesBuilder::new(&index)
        .with_max_unaligned(cfg.ingest.max_unaligned_samples)
        .build(&samples)?;

    let mut gate = CompletenessGate::new(0).with_instruments(cfg.ingest.instruments.clone());
    let mut window = WindowAggregator::new(&index, cfg.window_days())?.with_policy(cfg.min_policy());

    for series in built.series {
        let decision = gate.evaluate(&series, &index);
        match decision.action {
            GateAction::Admit => {
                window.append(series)?;
            }
            GateAction::Exclude | GateAction::Backfill => {
                warn!(
                    day = %decision.report.day,
                    observed = decision.report.observed,
                    expected = decision.report.expected,
                    short = ?decision.report.short_instruments,
                    "excluding incomplete day"
                );
            }
        }
    }

    match window.current() {
        WindowStatus::Ready(agg) => {
            let json = serde_json::to_string_pretty(&agg).context("serialize aggregate failed")?;
            println!("{}", json);
        }
        WindowStatus::NotReady { held, required } => {
            println!("window_ready=false held={} required={}", held, required);
        }
    }
    Ok(())
}
