//! Poll schedule: each slot end plus a small lag (09:35:01, 09:40:01, ...).

use chrono::{Duration, NaiveTime};

use ivp_engine::SlotIndex;

pub fn refresh_points(index: &SlotIndex, lag_secs: u32) -> Vec<NaiveTime> {
    let lag = Duration::seconds(i64::from(lag_secs));
    index.slots().iter().map(|s| s.as_time() + lag).collect()
}

/// First refresh point strictly after `now`, or `None` once the session is
/// over.
pub fn next_refresh_after(points: &[NaiveTime], now: NaiveTime) -> Option<NaiveTime> {
    points.iter().copied().find(|p| *p > now)
}
