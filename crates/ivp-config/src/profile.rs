//! Typed view over the merged config tree.

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use ivp_engine::{
    EngineError, MinPolicy, SessionSegment, SlotIndex, DEFAULT_MAX_UNALIGNED, DEFAULT_WINDOW_DAYS,
};

use crate::LoadedConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub open: String,
    pub close: String,
}

impl SessionWindow {
    fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    pub window_days: usize,
    pub interval_minutes: u16,
    pub sessions: Vec<SessionWindow>,
    pub min_policy: MinPolicy,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            interval_minutes: 5,
            sessions: vec![
                SessionWindow::new("09:30", "11:30"),
                SessionWindow::new("13:00", "15:00"),
            ],
            min_policy: MinPolicy::ZeroSentinel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Instruments summed into one series per day.
    pub instruments: Vec<String>,
    pub max_backfill_attempts: u32,
    pub max_unaligned_samples: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            instruments: vec!["000001.SH".to_string(), "399001.SZ".to_string()],
            max_backfill_attempts: 1,
            max_unaligned_samples: DEFAULT_MAX_UNALIGNED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSection {
    /// Bars requested per instrument on each poll.
    pub fetch_limit: usize,
    /// Seconds after a slot end before it is polled.
    pub refresh_lag_secs: u32,
    /// IANA name of the exchange clock.
    pub timezone: String,
}

impl Default for LiveSection {
    fn default() -> Self {
        Self {
            fetch_limit: 48,
            refresh_lag_secs: 1,
            timezone: "Asia/Shanghai".to_string(),
        }
    }
}

impl LiveSection {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("live.timezone '{}' is not a known zone: {e}", self.timezone))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub profile: ProfileSection,
    pub ingest: IngestSection,
    pub live: LiveSection,
}

impl ProfileConfig {
    /// Read and validate the typed view. Sections other than `profile`,
    /// `ingest` and `live` are ignored here; see
    /// [`crate::report_unused_keys`].
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let mut tree = loaded.config_json.clone();
        if let Some(obj) = tree.as_object_mut() {
            obj.retain(|k, _| matches!(k.as_str(), "profile" | "ingest" | "live"));
        }
        let cfg: ProfileConfig =
            serde_json::from_value(tree).context("config does not match the profile schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.profile.window_days == 0 {
            bail!("CONFIGURATION_ERROR: profile.window_days must be >= 1");
        }
        if self.ingest.instruments.is_empty() {
            bail!("CONFIGURATION_ERROR: ingest.instruments must name at least one instrument");
        }
        if self.live.fetch_limit == 0 {
            bail!("CONFIGURATION_ERROR: live.fetch_limit must be >= 1");
        }
        self.live.tz()?;
        self.slot_index()?;
        Ok(())
    }

    pub fn session_segments(&self) -> Result<Vec<SessionSegment>, EngineError> {
        self.profile
            .sessions
            .iter()
            .map(|s| SessionSegment::parse(&s.open, &s.close))
            .collect()
    }

    /// Build the slot grid described by `profile`.
    pub fn slot_index(&self) -> Result<SlotIndex, EngineError> {
        let segments = self.session_segments()?;
        SlotIndex::new(self.profile.interval_minutes, &segments)
    }

    pub fn window_days(&self) -> usize {
        self.profile.window_days
    }

    pub fn min_policy(&self) -> MinPolicy {
        self.profile.min_policy
    }
}
