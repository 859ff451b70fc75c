use chrono::NaiveDate;
use ivp_engine::*;
use ivp_md::*;

fn day_samples(d: u32, slots: usize) -> Vec<RawSample> {
    let idx = SlotIndex::cn_a_share_5m();
    let date = NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
    idx.slots()
        .iter()
        .take(slots)
        .map(|s| RawSample::new("000001.SH", date.and_time(s.as_time()), 5e8))
        .collect()
}

#[tokio::test]
async fn scenario_fixture_backfill_repairs_day() {
    let idx = SlotIndex::cn_a_share_5m();
    let day = TradingDay::from_ymd(2025, 1, 2).unwrap();
    let provider = FixtureProvider::new().with_history(day_samples(2, 40));
    provider.stage_repair("000001.SH", day, day_samples(2, 48));

    let before = provider.fetch("000001.SH", 5, day, day).await.unwrap();
    let series = SeriesBuilder::new(&idx).build_day(day, &before).unwrap();
    assert!(check_completeness(&series, &idx).is_incomplete());

    provider.backfill("000001.SH", 5, day).await.unwrap();

    let after = provider.fetch("000001.SH", 5, day, day).await.unwrap();
    let series = SeriesBuilder::new(&idx).build_day(day, &after).unwrap();
    assert!(check_completeness(&series, &idx).is_complete());
    assert_eq!(series.get("15:00".parse().unwrap()), Some(5.0));
}

#[tokio::test]
async fn scenario_csv_feeds_fixture_provider() {
    let csv = "instrument,timestamp,amount\n\
               000001.SH,20250102093500,100000000\n\
               399001.SZ,20250102093500,300000000\n";
    let rows = ivp_md::ingest_csv::parse_samples_csv_str(csv).unwrap();
    let provider = FixtureProvider::new().with_history(rows);
    let day = TradingDay::from_ymd(2025, 1, 2).unwrap();

    let sh = provider.fetch("000001.SH", 5, day, day).await.unwrap();
    let sz = provider.fetch("399001.SZ", 5, day, day).await.unwrap();
    assert_eq!(sh.len() + sz.len(), 2);
}
