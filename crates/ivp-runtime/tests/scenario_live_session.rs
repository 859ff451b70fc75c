use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use ivp_engine::*;
use ivp_md::*;
use ivp_runtime::*;

const INST: &str = "000001.SH";

fn today_samples(slots: usize) -> Vec<RawSample> {
    let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
    SlotIndex::cn_a_share_5m()
        .slots()
        .iter()
        .take(slots)
        .map(|s| RawSample::new(INST, date.and_time(s.as_time()), 2e8))
        .collect()
}

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 9)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn calendar() -> Arc<StaticCalendar> {
    Arc::new(StaticCalendar::from_labels(&["20250108", "20250109"]).unwrap())
}

fn drain(rx: &mut EventReceiver) -> Vec<ProfileEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

#[tokio::test]
async fn scenario_session_runs_to_close_and_survives_transient_failure() {
    let index = SlotIndex::cn_a_share_5m();
    let provider = Arc::new(FixtureProvider::new());
    provider.set_live(INST, today_samples(48));
    provider.inject_failure(ProviderError::Transport("timeout".into()));

    let (tx, mut rx) = event_channel();
    let mut task = LivePollTask::new(
        index.clone(),
        vec![INST.to_string()],
        48,
        calendar(),
        provider.clone(),
        tx,
    );
    let schedule = refresh_points(&index, 1);
    let clock = ManualClock::new(at(9, 0, 0));

    let summary = run_live_session(&mut task, &schedule, &clock).await;

    assert_eq!(summary.end, SessionEnd::Finished);
    assert_eq!(summary.retries, 1);
    // One catch-up poll at 09:00 plus one per refresh point.
    assert_eq!(summary.polls, 49);
    assert_eq!(summary.updates, 48);
    assert_eq!(clock.now(), at(15, 0, 1));

    let last = task.last().unwrap();
    assert_eq!(last.len(), 48);
    assert_eq!(last.get("15:00".parse().unwrap()).unwrap().total, 2.0);

    let events = drain(&mut rx);
    assert!(matches!(
        events[0],
        ProfileEvent::Error {
            retryable: true,
            ..
        }
    ));
    let lives = events
        .iter()
        .filter(|e| matches!(e, ProfileEvent::Live(_)))
        .count();
    assert_eq!(lives, 48);
}

#[tokio::test]
async fn scenario_mid_session_start_catches_up_immediately() {
    let index = SlotIndex::cn_a_share_5m();
    let provider = Arc::new(FixtureProvider::new());
    provider.set_live(INST, today_samples(10));

    let (tx, mut rx) = event_channel();
    let mut task = LivePollTask::new(index.clone(), vec![INST.to_string()], 48, calendar(), provider, tx);
    task.start().await.unwrap();

    let series = match task.poll(at(10, 20, 30)).await {
        PollOutcome::Updated(series) => series,
        other => panic!("expected an update, got {other:?}"),
    };
    assert_eq!(series.len(), 10);
    assert_eq!(series.last_slot().unwrap().to_string(), "10:20");

    // Same data at the next point: nothing new.
    assert_eq!(task.poll(at(10, 25, 1)).await, PollOutcome::Idle);
    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test]
async fn scenario_session_ends_when_schedule_runs_out() {
    let index = SlotIndex::cn_a_share_5m();
    let provider = Arc::new(FixtureProvider::new());
    provider.set_live(INST, today_samples(20));

    let (tx, _rx) = event_channel();
    let mut task = LivePollTask::new(index.clone(), vec![INST.to_string()], 48, calendar(), provider, tx);
    let schedule = refresh_points(&index, 1);
    let clock = ManualClock::new(at(14, 0, 0));

    let summary = run_live_session(&mut task, &schedule, &clock).await;

    assert_eq!(summary.end, SessionEnd::ScheduleExhausted);
    assert_eq!(summary.polls, 13);
    assert_eq!(summary.updates, 1);
}

#[tokio::test]
async fn scenario_calendar_failure_at_start_is_fatal() {
    let index = SlotIndex::cn_a_share_5m();
    let provider = Arc::new(FixtureProvider::new());
    let (tx, _rx) = event_channel();
    let empty = Arc::new(StaticCalendar::new(std::iter::empty()));
    let mut task = LivePollTask::new(index.clone(), vec![INST.to_string()], 48, empty, provider.clone(), tx);
    let clock = ManualClock::new(at(9, 0, 0));

    let summary = run_live_session(&mut task, &refresh_points(&index, 1), &clock).await;

    let SessionEnd::Fatal(err) = summary.end else {
        panic!("expected fatal end");
    };
    assert!(err.is_fatal());
    assert_eq!(summary.polls, 0);
    assert_eq!(provider.latest_calls(), 0);
}

#[tokio::test]
async fn scenario_aggregate_published_before_live_rows() {
    let index = SlotIndex::cn_a_share_5m();
    let provider = Arc::new(FixtureProvider::new());
    provider.set_live(INST, today_samples(1));

    let mut window = WindowAggregator::new(&index, 1).unwrap();
    let prev = TradingDay::from_ymd(2025, 1, 8).unwrap();
    let status = window
        .append(DailySeries::new(prev, index.slots().iter().map(|s| (*s, 3.0))))
        .unwrap();
    let agg = status.ready().unwrap().clone();

    let (tx, mut rx) = event_channel();
    let mut task = LivePollTask::new(index.clone(), vec![INST.to_string()], 48, calendar(), provider, tx)
        .with_aggregate(agg.clone());
    task.start().await.unwrap();
    task.poll(at(9, 35, 1)).await;

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ProfileEvent::Aggregate(agg));
    assert!(matches!(&events[1], ProfileEvent::Live(s) if s.len() == 1));

    let json = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(json["type"], "live");
    assert_eq!(json["day"], "20250109");
}
