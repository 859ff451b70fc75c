use ivp_engine::*;

fn flat_day(idx: &SlotIndex, d: u32, value: f64) -> DailySeries {
    let day = TradingDay::from_ymd(2025, 1, d).unwrap();
    DailySeries::new(day, idx.slots().iter().map(|s| (*s, value)))
}

#[test]
fn scenario_five_day_band() {
    let idx = SlotIndex::cn_a_share_5m();
    let mut w = WindowAggregator::new(&idx, DEFAULT_WINDOW_DAYS).unwrap();

    assert!(!w.current().is_ready());
    let mut status = None;
    for (i, d) in [2, 3, 6, 7, 8].into_iter().enumerate() {
        status = Some(w.append(flat_day(&idx, d, (i as f64 + 1.0) * 1000.0)).unwrap());
    }
    let status = status.unwrap();

    let result = status.ready().expect("window ready after 5 days");
    assert_eq!(result.rows.len(), 48);
    for row in &result.rows {
        assert_eq!(row.average, 3000.0);
        assert_eq!(row.max, 5000.0);
        assert_eq!(row.min, 1000.0);
    }
    assert_eq!(result.days.len(), 5);
    assert_eq!(result.as_of().unwrap().to_string(), "20250108");
    assert_eq!(w.current(), status);
}

#[test]
fn scenario_average_matches_rounded_mean_per_slot() {
    let idx = SlotIndex::cn_a_share_5m();
    let mut w = WindowAggregator::new(&idx, 3).unwrap();

    let values = [[1.111, 2.5], [2.222, 0.0], [3.336, 7.25]];
    let mut status = None;
    for (i, pair) in values.iter().enumerate() {
        let day = TradingDay::from_ymd(2025, 2, i as u32 + 3).unwrap();
        let series = DailySeries::new(
            day,
            idx.slots()
                .iter()
                .enumerate()
                .map(|(k, s)| (*s, pair[k % 2])),
        );
        status = Some(w.append(series).unwrap());
    }
    let result = status.unwrap().ready().cloned().unwrap();

    for (k, row) in result.rows.iter().enumerate() {
        let col: Vec<f64> = values.iter().map(|p| p[k % 2]).collect();
        let expected = round2(col.iter().sum::<f64>() / 3.0);
        assert_eq!(row.average, expected, "slot {}", row.slot);
        let true_max = col.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(row.max, round2(true_max));
    }
}
