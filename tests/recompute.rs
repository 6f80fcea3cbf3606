use chrono::NaiveDate;
use road_accident_report::types::{AccidentRecord, DataPoint, Schema, YearSeries};
use road_accident_report::{
    loader, AggregateResult, Engine, FilterState, RecordStore, ResultData, Statistic, View,
};

fn record(province: &str, y: i32, m: u32, d: u32) -> AccidentRecord {
    let mut r = AccidentRecord::on(NaiveDate::from_ymd_opt(y, m, d).unwrap(), y);
    r.province = Some(province.to_string());
    r
}

fn series_len(result: &AggregateResult) -> usize {
    match &result.data {
        ResultData::Series { points } => points.len(),
        other => panic!("{:?} is not a series", other),
    }
}

fn series_values(result: &AggregateResult) -> Vec<f64> {
    match &result.data {
        ResultData::Series { points } => points.iter().map(|p| p.value).collect(),
        other => panic!("{:?} is not a series", other),
    }
}

/// A mixed store spanning both years, many provinces and accident types.
fn mixed_store() -> RecordStore {
    let mut records = Vec::new();
    for i in 0..300u32 {
        let year = 2021 + (i % 2) as i32;
        let mut r = record(&format!("P{}", i % 17), year, i % 12 + 1, i % 28 + 1);
        r.accident_type = format!("T{}", (i * 7) % 14);
        r.weather_condition = ["Clear", "Rain", "Fog"][(i % 3) as usize].to_string();
        r.occurred_at = Some(format!("{:02}:{:02}", i % 24, i % 60));
        r.death_count = u64::from(i % 5 == 0);
        r.serious_injury_count = u64::from(i % 3 == 0);
        r.minor_injury_count = u64::from(i % 2 == 0);
        r.total_injury_count = r.serious_injury_count + r.minor_injury_count;
        records.push(r);
    }
    RecordStore::new(records, Schema::default())
}

#[test]
fn single_death_in_january_scales_to_thousandths() {
    let mut r = record("X", 2021, 1, 15);
    r.death_count = 1;
    let engine = Engine::new(RecordStore::new(vec![r], Schema::default()));
    let bundle = engine.recompute(&FilterState::new(Statistic::Deaths));

    let trend = bundle.get(View::MonthlyTrend).unwrap();
    let ResultData::YearSeries { series, .. } = &trend.data else {
        panic!("expected year series");
    };
    assert_eq!(
        series,
        &vec![YearSeries {
            year: 2021,
            points: vec![DataPoint::new("January", 0.001)],
        }]
    );
}

#[test]
fn unmatched_province_yields_empty_views_without_error() {
    let mut r = record("X", 2021, 1, 15);
    r.death_count = 1;
    r.occurred_at = Some("10:00".to_string());
    let engine = Engine::new(RecordStore::new(vec![r], Schema::default()));
    let bundle = engine.recompute(&FilterState::new(Statistic::Deaths).with_provinces(["Y"]));

    assert_eq!(bundle.results.len(), 10);
    for result in &bundle.results {
        assert!(!result.is_placeholder(), "{} failed", result.view.name());
        if result.view == View::Severity {
            assert_eq!(series_values(result), vec![0.0, 0.0, 0.0]);
        } else if result.view == View::VehicleTypes {
            assert!(series_values(result).iter().all(|v| *v == 0.0));
        } else {
            assert_eq!(result.row_count(), 0, "{} not empty", result.view.name());
        }
        assert!(result.title.ends_with("- province: Y"));
    }
}

#[test]
fn bad_time_is_only_excluded_from_heatmap() {
    let mut bad = record("X", 2022, 5, 1);
    bad.occurred_at = Some("99:99".to_string());
    let mut good = record("X", 2022, 5, 2);
    good.occurred_at = Some("08:30".to_string());
    let engine = Engine::new(RecordStore::new(vec![bad, good], Schema::default()));
    let bundle = engine.recompute(&FilterState::default());

    assert_eq!(bundle.get(View::HourByMonth).unwrap().row_count(), 1);
    assert_eq!(series_values(bundle.get(View::TopProvinces).unwrap()), vec![2.0]);
    assert_eq!(bundle.get(View::DailyAccidents).unwrap().row_count(), 2);
    assert_eq!(series_values(bundle.get(View::AccidentTypes).unwrap()), vec![2.0]);
}

#[test]
fn fifteen_tied_accident_types_keep_first_ten_seen() {
    let records = (0..15)
        .map(|i| {
            let mut r = record("X", 2021, 3, 1);
            r.accident_type = format!("type-{:02}", 14 - i);
            r
        })
        .collect();
    let engine = Engine::new(RecordStore::new(records, Schema::default()));
    let bundle = engine.recompute(&FilterState::default());
    let ResultData::Series { points } = &bundle.get(View::AccidentTypes).unwrap().data else {
        panic!("expected series");
    };
    let keys: Vec<String> = points.iter().map(|p| p.key.clone()).collect();
    let expected: Vec<String> = (0..10).map(|i| format!("type-{:02}", 14 - i)).collect();
    assert_eq!(keys, expected);
}

#[test]
fn recompute_is_deterministic() {
    let engine = Engine::new(mixed_store());
    let filter = FilterState::new(Statistic::TotalInjuries).with_provinces(["P1", "P3", "P5", "P7"]);
    let first = serde_json::to_string(&engine.recompute(&filter)).unwrap();
    let second = serde_json::to_string(&engine.recompute(&filter)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn filtered_views_only_see_selected_provinces() {
    let engine = Engine::new(mixed_store());
    let filter = FilterState::default().with_provinces(["P2", "P9"]);
    let bundle = engine.recompute(&filter);
    for view in [View::TopProvinces, View::FatalitiesByProvince, View::InjuriesByProvince] {
        let ResultData::Series { points } = &bundle.get(view).unwrap().data else {
            panic!("expected series");
        };
        assert!(points.iter().all(|p| p.key == "P2" || p.key == "P9"));
    }
    let total: f64 = series_values(bundle.get(View::DailyAccidents).unwrap()).iter().sum();
    let expected = engine
        .store()
        .records()
        .iter()
        .filter(|r| matches!(r.province.as_deref(), Some("P2") | Some("P9")))
        .count();
    assert_eq!(total as usize, expected);
    assert!(bundle.get(View::TopProvinces).unwrap().title.ends_with("- province: P2, P9"));
}

#[test]
fn top_n_views_are_bounded_and_descending() {
    let engine = Engine::new(mixed_store());
    let bundle = engine.recompute(&FilterState::default());
    for view in [
        View::AccidentTypes,
        View::FatalitiesByProvince,
        View::InjuriesByProvince,
        View::TopProvinces,
    ] {
        let result = bundle.get(view).unwrap();
        assert!(series_len(result) <= 10, "{} too long", view.name());
        let values = series_values(result);
        assert!(values.windows(2).all(|w| w[0] >= w[1]), "{} not sorted", view.name());
    }
}

#[test]
fn severity_sums_are_bounded_by_record_count() {
    let store = mixed_store();
    let n = store.len() as f64;
    let bundle = Engine::new(store).recompute(&FilterState::default());
    let values = series_values(bundle.get(View::Severity).unwrap());
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| *v <= n));
}

#[test]
fn monthly_order_ignores_input_order() {
    let months = [11, 2, 7, 1, 12, 5, 9, 3, 10, 4, 8, 6];
    let records = months.iter().map(|&m| record("X", 2022, m, 1)).collect();
    let bundle = Engine::new(RecordStore::new(records, Schema::default())).recompute(&FilterState::default());
    let ResultData::YearSeries { series, axis_range } = &bundle.get(View::MonthlyTrend).unwrap().data else {
        panic!("expected year series");
    };
    let keys: Vec<&str> = series[0].points.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, road_accident_report::util::MONTH_NAMES.to_vec());
    assert!((axis_range.unwrap().max - 0.0011).abs() < 1e-12);
}

#[test]
fn loads_csv_and_recomputes_end_to_end() {
    let header = "วันที่เกิดเหตุ,เวลา,จังหวัด,ลักษณะการเกิดเหตุ,สภาพอากาศ,ผู้เสียชีวิต,ผู้บาดเจ็บสาหัส,ผู้บาดเจ็บเล็กน้อย,รวมจำนวนผู้บาดเจ็บ,รถจักรยานยนต์,รถยนต์นั่งส่วนบุคคล,รถปิคอัพบรรทุก4ล้อ,รถบรรทุก6ล้อ,รถอื่นๆ";
    let dir = tempfile::tempdir().unwrap();
    let path_2021 = dir.path().join("a2021.csv");
    let path_2022 = dir.path().join("a2022.csv");
    std::fs::write(
        &path_2021,
        format!("{header}\n03/03/2021,18:20,Chiang Mai,Overturn,Clear,2,1,0,1,1,0,0,0,0\n"),
    )
    .unwrap();
    std::fs::write(
        &path_2022,
        format!("{header}\n04/03/2022,07:05,Phuket,Rear-end,Rain,0,0,3,3,2,1,0,0,0\nxx,07:05,Phuket,Rear-end,Rain,0,0,3,3,2,1,0,0,0\n"),
    )
    .unwrap();

    let (store, report) = loader::load_store(&path_2021, &path_2022).unwrap();
    assert_eq!(report.kept_rows(), 2);
    assert_eq!(report.dropped_rows(), 1);

    let bundle = Engine::new(store).recompute(&FilterState::new(Statistic::MinorInjuries));
    let ResultData::YearSeries { series, .. } = &bundle.get(View::MonthlyTrend).unwrap().data else {
        panic!("expected year series");
    };
    assert_eq!(series.len(), 2);
    assert_eq!(series[1].points, vec![DataPoint::new("March", 0.003)]);
    assert_eq!(bundle.get(View::HourByMonth).unwrap().row_count(), 2);
    assert_eq!(
        series_values(bundle.get(View::VehicleTypes).unwrap()),
        vec![3.0, 1.0, 0.0, 0.0, 0.0]
    );
}
