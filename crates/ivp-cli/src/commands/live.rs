//! `ivp live`: today's samples in, live series as of `--now` out.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use ivp_config::ConfigMode;
use ivp_engine::{LiveTracker, TradingDay};

use super::{load_config, load_samples};

pub fn run(config_paths: &[String], csv: &str, day: &str, now: &str) -> Result<()> {
    let day: TradingDay = day
        .parse()
        .with_context(|| format!("invalid --day '{}' (expected YYYYMMDD)", day))?;
    let now = parse_clock(now)?;

    let cfg = load_config(config_paths, ConfigMode::Live)?;
    let samples = load_samples(csv, &cfg)?;

    let mut tracker = LiveTracker::new(cfg.slot_index()?, day);
    let series = tracker.update(&samples, now);

    let json = serde_json::to_string_pretty(&series).context("serialize live series failed")?;
    println!("{}", json);
    Ok(())
}

fn parse_clock(s: &str) -> Result<NaiveTime> {
    let t = s.trim();
    NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .with_context(|| format!("invalid --now '{}' (expected HH:MM or HH:MM:SS)", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accepts_minutes_or_seconds() {
        assert_eq!(
            parse_clock("10:05").unwrap(),
            NaiveTime::from_hms_opt(10, 5, 0).unwrap()
        );
        assert_eq!(
            parse_clock("10:05:01").unwrap(),
            NaiveTime::from_hms_opt(10, 5, 1).unwrap()
        );
        assert!(parse_clock("10h05").is_err());
    }
}
