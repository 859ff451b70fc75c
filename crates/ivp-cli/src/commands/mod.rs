//! Command handler modules for the `ivp` binary.
//!
//! Shared loading steps live here; command-specific logic lives in the
//! submodules.

pub mod live;
pub mod profile;

use std::path::Path;

use anyhow::{Context, Result};
use ivp_config::{ConfigMode, ProfileConfig, UnusedKeyPolicy};
use ivp_engine::RawSample;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered YAML, warn about keys `mode` never reads, return the typed
/// view.
pub fn load_config(paths: &[String], mode: ConfigMode) -> Result<ProfileConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = ivp_config::load_layered_yaml(&path_refs)?;

    let report =
        ivp_config::report_unused_keys(mode, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(
            mode = mode.as_str(),
            unused = ?report.unused_leaf_pointers,
            "config has keys this command does not read"
        );
    }

    let cfg = ProfileConfig::from_loaded(&loaded)?;
    info!(config_hash = %loaded.config_hash, mode = mode.as_str(), "config loaded");
    Ok(cfg)
}

/// Read a samples CSV, keeping only the configured instruments.
pub fn load_samples(path: &str, cfg: &ProfileConfig) -> Result<Vec<RawSample>> {
    let all = ivp_md::ingest_csv::parse_samples_csv_file(Path::new(path))
        .with_context(|| format!("read samples csv failed: {}", path))?;
    let total = all.len();
    let kept: Vec<RawSample> = all
        .into_iter()
        .filter(|s| cfg.ingest.instruments.iter().any(|i| *i == s.instrument))
        .collect();
    if kept.len() < total {
        info!(
            skipped = total - kept.len(),
            "ignoring samples for instruments outside ingest.instruments"
        );
    }
    Ok(kept)
}
