use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tabled::Tabled;

use crate::util::{format_number, month_name};

/// One CSV row as published, before any cleaning. Column headers are the
/// Thai names used by the source data set.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "วันที่เกิดเหตุ", default)]
    pub date: Option<String>,
    #[serde(rename = "เวลา", default)]
    pub time: Option<String>,
    #[serde(rename = "จังหวัด", default)]
    pub province: Option<String>,
    #[serde(rename = "ลักษณะการเกิดเหตุ", default)]
    pub accident_type: Option<String>,
    #[serde(rename = "สภาพอากาศ", default)]
    pub weather: Option<String>,
    #[serde(rename = "ผู้เสียชีวิต", default)]
    pub deaths: Option<String>,
    #[serde(rename = "ผู้บาดเจ็บสาหัส", default)]
    pub serious_injuries: Option<String>,
    #[serde(rename = "ผู้บาดเจ็บเล็กน้อย", default)]
    pub minor_injuries: Option<String>,
    #[serde(rename = "รวมจำนวนผู้บาดเจ็บ", default)]
    pub total_injuries: Option<String>,
    #[serde(rename = "รถจักรยานยนต์", default)]
    pub motorcycles: Option<String>,
    #[serde(rename = "รถยนต์นั่งส่วนบุคคล", default)]
    pub private_cars: Option<String>,
    #[serde(rename = "รถปิคอัพบรรทุก4ล้อ", default)]
    pub pickups: Option<String>,
    #[serde(rename = "รถบรรทุก6ล้อ", default)]
    pub trucks: Option<String>,
    #[serde(rename = "รถอื่นๆ", default)]
    pub other_vehicles: Option<String>,
}

/// Header of the optional time-of-day column.
pub const TIME_COLUMN: &str = "เวลา";

/// The quantity the monthly trend measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Statistic {
    Accidents,
    Deaths,
    SeriousInjuries,
    MinorInjuries,
    TotalInjuries,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Statistic::Accidents,
        Statistic::Deaths,
        Statistic::SeriousInjuries,
        Statistic::MinorInjuries,
        Statistic::TotalInjuries,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Statistic::Accidents => "Accident count",
            Statistic::Deaths => "Deaths",
            Statistic::SeriousInjuries => "Serious injuries",
            Statistic::MinorInjuries => "Minor injuries",
            Statistic::TotalInjuries => "Total injuries",
        }
    }

    /// Contribution of a single record to this statistic. Every record counts
    /// as one accident.
    pub fn value_of(self, record: &AccidentRecord) -> u64 {
        match self {
            Statistic::Accidents => 1,
            Statistic::Deaths => record.death_count,
            Statistic::SeriousInjuries => record.serious_injury_count,
            Statistic::MinorInjuries => record.minor_injury_count,
            Statistic::TotalInjuries => record.total_injury_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleCategory {
    Motorcycle,
    PrivateCar,
    Pickup,
    Truck,
    Other,
}

// Internal key -> display name. Order here is the column order of the source.
static VEHICLE_LABELS: [(VehicleCategory, &str); 5] = [
    (VehicleCategory::Motorcycle, "Motorcycle"),
    (VehicleCategory::PrivateCar, "Private car"),
    (VehicleCategory::Pickup, "Pickup (4 wheels)"),
    (VehicleCategory::Truck, "Truck (6 wheels)"),
    (VehicleCategory::Other, "Other vehicles"),
];

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 5] = [
        VehicleCategory::Motorcycle,
        VehicleCategory::PrivateCar,
        VehicleCategory::Pickup,
        VehicleCategory::Truck,
        VehicleCategory::Other,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        VEHICLE_LABELS
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, label)| *label)
            .unwrap_or("Unknown")
    }
}

/// Vehicles involved in one accident, one slot per [`VehicleCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VehicleCounts([u64; 5]);

impl VehicleCounts {
    pub fn get(&self, category: VehicleCategory) -> u64 {
        self.0[category.index()]
    }

    pub fn set(&mut self, category: VehicleCategory, count: u64) {
        self.0[category.index()] = count;
    }

    pub fn with(mut self, category: VehicleCategory, count: u64) -> Self {
        self.set(category, count);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccidentRecord {
    pub occurred_on: NaiveDate,
    pub occurred_at: Option<String>,
    pub year: i32,
    pub month_name: &'static str,
    pub province: Option<String>,
    pub accident_type: String,
    pub weather_condition: String,
    pub death_count: u64,
    pub serious_injury_count: u64,
    pub minor_injury_count: u64,
    pub total_injury_count: u64,
    pub vehicles: VehicleCounts,
    pub source_year_tag: i32,
}

impl AccidentRecord {
    /// A record with no casualties or vehicles; `year` and `month_name` are
    /// derived from the date.
    pub fn on(occurred_on: NaiveDate, source_year_tag: i32) -> Self {
        use chrono::Datelike;
        AccidentRecord {
            occurred_on,
            occurred_at: None,
            year: occurred_on.year(),
            month_name: month_name(occurred_on.month()),
            province: None,
            accident_type: crate::util::UNSPECIFIED.to_string(),
            weather_condition: crate::util::UNSPECIFIED.to_string(),
            death_count: 0,
            serious_injury_count: 0,
            minor_injury_count: 0,
            total_injury_count: 0,
            vehicles: VehicleCounts::default(),
            source_year_tag,
        }
    }
}

/// Column-level facts about the loaded inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub has_time_column: bool,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            has_time_column: true,
        }
    }
}

/// All accident records from both source years. Built once, read-only after.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<AccidentRecord>,
    schema: Schema,
}

impl RecordStore {
    pub fn new(records: Vec<AccidentRecord>, schema: Schema) -> Self {
        RecordStore { records, schema }
    }

    pub fn records(&self) -> &[AccidentRecord] {
        &self.records
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct provinces, as offered by a province selector.
    pub fn provinces(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|r| r.province.as_deref())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub statistic: Statistic,
    pub provinces: BTreeSet<String>,
}

impl FilterState {
    pub fn new(statistic: Statistic) -> Self {
        FilterState {
            statistic,
            provinces: BTreeSet::new(),
        }
    }

    pub fn with_provinces<I, S>(mut self, provinces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provinces = provinces.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState::new(Statistic::Accidents)
    }
}

/// The ten views produced on every recomputation, in bundle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    MonthlyTrend,
    AccidentTypes,
    FatalitiesByProvince,
    InjuriesByProvince,
    HourByMonth,
    VehicleTypes,
    WeatherConditions,
    Severity,
    DailyAccidents,
    TopProvinces,
}

impl View {
    pub const ALL: [View; 10] = [
        View::MonthlyTrend,
        View::AccidentTypes,
        View::FatalitiesByProvince,
        View::InjuriesByProvince,
        View::HourByMonth,
        View::VehicleTypes,
        View::WeatherConditions,
        View::Severity,
        View::DailyAccidents,
        View::TopProvinces,
    ];

    pub fn name(self) -> &'static str {
        match self {
            View::MonthlyTrend => "monthly_trend",
            View::AccidentTypes => "accident_types",
            View::FatalitiesByProvince => "fatalities_by_province",
            View::InjuriesByProvince => "injuries_by_province",
            View::HourByMonth => "hour_by_month",
            View::VehicleTypes => "vehicle_types",
            View::WeatherConditions => "weather_conditions",
            View::Severity => "severity",
            View::DailyAccidents => "daily_accidents",
            View::TopProvinces => "top_provinces",
        }
    }

    /// Title without the province qualifier. The monthly trend title depends
    /// on the selected statistic.
    pub fn title_stem(self, statistic: Statistic) -> String {
        match self {
            View::MonthlyTrend => format!("Monthly trend of {}", statistic.label().to_lowercase()),
            View::AccidentTypes => "Accident types".to_string(),
            View::FatalitiesByProvince => "Top 10 provinces by fatalities".to_string(),
            View::InjuriesByProvince => "Top 10 provinces by injuries".to_string(),
            View::HourByMonth => "Accidents by hour of day and month".to_string(),
            View::VehicleTypes => "Vehicle types involved in accidents".to_string(),
            View::WeatherConditions => "Weather conditions at time of accident".to_string(),
            View::Severity => "Accident severity".to_string(),
            View::DailyAccidents => "Daily accidents".to_string(),
            View::TopProvinces => "Top 10 provinces by accidents".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub key: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        DataPoint {
            key: key.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSeries {
    pub year: i32,
    pub points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatCell {
    pub month: &'static str,
    pub hour: u32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultData {
    Series {
        points: Vec<DataPoint>,
    },
    YearSeries {
        series: Vec<YearSeries>,
        axis_range: Option<AxisRange>,
    },
    Grid {
        cells: Vec<HeatCell>,
    },
    Placeholder {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub view: View,
    pub title: String,
    pub data: ResultData,
}

impl AggregateResult {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.data, ResultData::Placeholder { .. })
    }

    /// Number of data rows: points, summed across series, or grid cells.
    pub fn row_count(&self) -> usize {
        match &self.data {
            ResultData::Series { points } => points.len(),
            ResultData::YearSeries { series, .. } => series.iter().map(|s| s.points.len()).sum(),
            ResultData::Grid { cells } => cells.len(),
            ResultData::Placeholder { .. } => 0,
        }
    }

    /// Flattens the result into `(series, key, value)` rows for tables and CSV.
    pub fn rows(&self) -> Vec<ResultRow> {
        match &self.data {
            ResultData::Series { points } => points
                .iter()
                .map(|p| ResultRow {
                    series: String::new(),
                    key: p.key.clone(),
                    value: p.value,
                })
                .collect(),
            ResultData::YearSeries { series, .. } => series
                .iter()
                .flat_map(|s| {
                    s.points.iter().map(move |p| ResultRow {
                        series: s.year.to_string(),
                        key: p.key.clone(),
                        value: p.value,
                    })
                })
                .collect(),
            ResultData::Grid { cells } => cells
                .iter()
                .map(|c| ResultRow {
                    series: c.month.to_string(),
                    key: format!("{:02}", c.hour),
                    value: c.count as f64,
                })
                .collect(),
            ResultData::Placeholder { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ResultRow {
    #[serde(rename = "Series")]
    #[tabled(rename = "Series")]
    pub series: String,
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value", display_with = "display_value")]
    pub value: f64,
}

fn display_value(value: &f64) -> String {
    if value.fract() == 0.0 {
        format_number(*value, 0)
    } else {
        format_number(*value, 3)
    }
}

/// All ten results of one recomputation, tagged with the filter that
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle {
    pub filter: FilterState,
    pub results: Vec<AggregateResult>,
}

impl Bundle {
    pub fn get(&self, view: View) -> Option<&AggregateResult> {
        self.results.iter().find(|r| r.view == view)
    }

    /// A bundle is stale once the filter has moved on.
    pub fn is_current_for(&self, filter: &FilterState) -> bool {
        self.filter == *filter
    }
}
