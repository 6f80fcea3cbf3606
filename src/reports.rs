// The ten aggregate views. Each one is a pure function of the filtered
// records; none reads another's output.
use crate::error::PipelineError;
use crate::filter::FilteredView;
use crate::types::{
    AccidentRecord, AggregateResult, AxisRange, DataPoint, HeatCell, ResultData, VehicleCategory,
    View, YearSeries,
};
use crate::util::{month_rank, parse_hour, Tally};
use std::collections::BTreeMap;

const TOP_N: usize = 10;

/// Monthly trend values are shown in thousands.
const TREND_SCALE: f64 = 1000.0;

/// Headroom above the largest trend value.
const AXIS_HEADROOM: f64 = 1.1;

/// Run one view's pipeline.
pub fn run(view: View, data: &FilteredView) -> Result<AggregateResult, PipelineError> {
    match view {
        View::MonthlyTrend => Ok(monthly_trend(data)),
        View::AccidentTypes => Ok(accident_types(data)),
        View::FatalitiesByProvince => Ok(fatalities_by_province(data)),
        View::InjuriesByProvince => Ok(injuries_by_province(data)),
        View::HourByMonth => hour_by_month(data),
        View::VehicleTypes => Ok(vehicle_types(data)),
        View::WeatherConditions => Ok(weather_conditions(data)),
        View::Severity => Ok(severity(data)),
        View::DailyAccidents => Ok(daily_accidents(data)),
        View::TopProvinces => Ok(top_provinces(data)),
    }
}

/// Stand-in for a view whose pipeline failed.
pub fn placeholder(view: View, data: &FilteredView, error: &PipelineError) -> AggregateResult {
    AggregateResult {
        view,
        title: data.title(view),
        data: ResultData::Placeholder {
            message: format!("Unable to display data: {}", error),
        },
    }
}

fn series(view: View, data: &FilteredView, entries: Vec<(String, u64)>) -> AggregateResult {
    AggregateResult {
        view,
        title: data.title(view),
        data: ResultData::Series {
            points: entries
                .into_iter()
                .map(|(key, value)| DataPoint::new(key, value as f64))
                .collect(),
        },
    }
}

pub fn monthly_trend(data: &FilteredView) -> AggregateResult {
    let statistic = data.statistic;
    let mut by_year: BTreeMap<i32, BTreeMap<usize, (&'static str, u64)>> = BTreeMap::new();
    for r in &data.records {
        let slot = by_year
            .entry(r.year)
            .or_default()
            .entry(month_rank(r.month_name))
            .or_insert((r.month_name, 0));
        slot.1 += statistic.value_of(r);
    }

    let series: Vec<YearSeries> = by_year
        .into_iter()
        .map(|(year, months)| YearSeries {
            year,
            points: months
                .into_values()
                .map(|(month, total)| DataPoint::new(month, total as f64 / TREND_SCALE))
                .collect(),
        })
        .collect();

    let axis_range = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.value))
        .reduce(f64::max)
        .map(|max| AxisRange {
            min: 0.0,
            max: max * AXIS_HEADROOM,
        });

    AggregateResult {
        view: View::MonthlyTrend,
        title: data.title(View::MonthlyTrend),
        data: ResultData::YearSeries { series, axis_range },
    }
}

pub fn accident_types(data: &FilteredView) -> AggregateResult {
    let mut tally = Tally::new();
    for r in &data.records {
        tally.add(r.accident_type.clone(), 1);
    }
    series(View::AccidentTypes, data, tally.top(Some(TOP_N)))
}

fn province_top(
    view: View,
    data: &FilteredView,
    amount: impl Fn(&AccidentRecord) -> u64,
) -> AggregateResult {
    let mut tally = Tally::new();
    for r in &data.records {
        if let Some(province) = &r.province {
            tally.add(province.clone(), amount(*r));
        }
    }
    series(view, data, tally.top(Some(TOP_N)))
}

pub fn fatalities_by_province(data: &FilteredView) -> AggregateResult {
    province_top(View::FatalitiesByProvince, data, |r| r.death_count)
}

pub fn injuries_by_province(data: &FilteredView) -> AggregateResult {
    province_top(View::InjuriesByProvince, data, |r| r.total_injury_count)
}

/// Accident counts per (month, hour). Records without a usable `HH:MM` time
/// are left out of this view only.
pub fn hour_by_month(data: &FilteredView) -> Result<AggregateResult, PipelineError> {
    if !data.schema.has_time_column {
        return Err(PipelineError::MissingColumn(crate::types::TIME_COLUMN));
    }
    let mut grid: BTreeMap<(usize, u32), (&'static str, u64)> = BTreeMap::new();
    for r in &data.records {
        let Some(hour) = parse_hour(r.occurred_at.as_deref()) else {
            continue;
        };
        grid.entry((month_rank(r.month_name), hour))
            .or_insert((r.month_name, 0))
            .1 += 1;
    }
    let cells = grid
        .into_iter()
        .map(|((_, hour), (month, count))| HeatCell { month, hour, count })
        .collect();
    Ok(AggregateResult {
        view: View::HourByMonth,
        title: data.title(View::HourByMonth),
        data: ResultData::Grid { cells },
    })
}

pub fn vehicle_types(data: &FilteredView) -> AggregateResult {
    let mut totals: Vec<(String, u64)> = VehicleCategory::ALL
        .iter()
        .map(|&category| {
            let sum = data.records.iter().map(|r| r.vehicles.get(category)).sum();
            (category.display_name().to_string(), sum)
        })
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    series(View::VehicleTypes, data, totals)
}

pub fn weather_conditions(data: &FilteredView) -> AggregateResult {
    let mut tally = Tally::new();
    for r in &data.records {
        tally.add(r.weather_condition.clone(), 1);
    }
    series(View::WeatherConditions, data, tally.top(None))
}

pub fn severity(data: &FilteredView) -> AggregateResult {
    let sum = |f: fn(&AccidentRecord) -> u64| data.records.iter().map(|&r| f(r)).sum::<u64>();
    let entries = vec![
        ("Fatal".to_string(), sum(|r| r.death_count)),
        ("Serious injury".to_string(), sum(|r| r.serious_injury_count)),
        ("Minor injury".to_string(), sum(|r| r.minor_injury_count)),
    ];
    series(View::Severity, data, entries)
}

pub fn daily_accidents(data: &FilteredView) -> AggregateResult {
    let mut by_day = BTreeMap::new();
    for r in &data.records {
        *by_day.entry(r.occurred_on).or_insert(0u64) += 1;
    }
    let entries = by_day
        .into_iter()
        .map(|(day, count)| (day.format("%Y-%m-%d").to_string(), count))
        .collect();
    series(View::DailyAccidents, data, entries)
}

pub fn top_provinces(data: &FilteredView) -> AggregateResult {
    province_top(View::TopProvinces, data, |_| 1)
}
