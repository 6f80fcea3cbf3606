use crate::error::LoadError;
use crate::types::{
    AccidentRecord, RawRow, RecordStore, Schema, VehicleCategory, VehicleCounts, TIME_COLUMN,
};
use crate::util::{clean_text, parse_count, parse_date_safe, UNSPECIFIED};
use csv::ReaderBuilder;
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Row accounting for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearLoad {
    pub source_year_tag: i32,
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows whose date did not parse.
    pub bad_dates: usize,
    /// Rows the CSV reader could not decode at all.
    pub malformed_rows: usize,
    pub has_time_column: bool,
}

impl YearLoad {
    pub fn dropped_rows(&self) -> usize {
        self.bad_dates + self.malformed_rows
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub years: Vec<YearLoad>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.years.iter().map(|y| y.total_rows).sum()
    }

    pub fn kept_rows(&self) -> usize {
        self.years.iter().map(|y| y.kept_rows).sum()
    }

    pub fn bad_dates(&self) -> usize {
        self.years.iter().map(|y| y.bad_dates).sum()
    }

    pub fn malformed_rows(&self) -> usize {
        self.years.iter().map(|y| y.malformed_rows).sum()
    }

    pub fn dropped_rows(&self) -> usize {
        self.years.iter().map(YearLoad::dropped_rows).sum()
    }
}

/// Load both source years, 2021 first, into one record store.
pub fn load_store(
    path_2021: impl AsRef<Path>,
    path_2022: impl AsRef<Path>,
) -> Result<(RecordStore, LoadReport), LoadError> {
    let mut records = Vec::new();
    let mut report = LoadReport::default();
    for (path, tag) in [(path_2021.as_ref(), 2021), (path_2022.as_ref(), 2022)] {
        let (rows, year) = load_year(path, tag)?;
        records.extend(rows);
        report.years.push(year);
    }
    // A file without the time column just contributes rows with no time; the
    // column only counts as missing when no input has it.
    let schema = Schema {
        has_time_column: report.years.iter().any(|y| y.has_time_column),
    };
    Ok((RecordStore::new(records, schema), report))
}

pub fn load_year(
    path: impl AsRef<Path>,
    source_year_tag: i32,
) -> Result<(Vec<AccidentRecord>, YearLoad), LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let (records, year) = read_year(file, source_year_tag)?;
    info!(
        "{}: {} rows read, {} kept, {} unparsable dates, {} malformed",
        path.display(),
        year.total_rows,
        year.kept_rows,
        year.bad_dates,
        year.malformed_rows
    );
    Ok((records, year))
}

/// Parse one year's CSV from any reader. Rows whose date does not parse, or
/// that cannot be decoded, are dropped and only show up in the counts.
pub fn read_year<R: Read>(
    reader: R,
    source_year_tag: i32,
) -> Result<(Vec<AccidentRecord>, YearLoad), LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let has_time_column = rdr.headers()?.iter().any(|h| h.trim() == TIME_COLUMN);

    let mut total_rows = 0usize;
    let mut bad_dates = 0usize;
    let mut malformed_rows = 0usize;
    let mut records = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("row {}: {}", total_rows, e);
                malformed_rows += 1;
                continue;
            }
        };
        let Some(occurred_on) = parse_date_safe(row.date.as_deref()) else {
            debug!("row {}: unparsable date {:?}", total_rows, row.date);
            bad_dates += 1;
            continue;
        };
        records.push(clean_row(row, occurred_on, source_year_tag));
    }

    let year = YearLoad {
        source_year_tag,
        total_rows,
        kept_rows: records.len(),
        bad_dates,
        malformed_rows,
        has_time_column,
    };
    Ok((records, year))
}

fn clean_row(row: RawRow, occurred_on: chrono::NaiveDate, source_year_tag: i32) -> AccidentRecord {
    let vehicles = VehicleCounts::default()
        .with(VehicleCategory::Motorcycle, parse_count(row.motorcycles.as_deref()))
        .with(VehicleCategory::PrivateCar, parse_count(row.private_cars.as_deref()))
        .with(VehicleCategory::Pickup, parse_count(row.pickups.as_deref()))
        .with(VehicleCategory::Truck, parse_count(row.trucks.as_deref()))
        .with(VehicleCategory::Other, parse_count(row.other_vehicles.as_deref()));

    AccidentRecord {
        occurred_at: clean_text(row.time),
        province: clean_text(row.province),
        accident_type: clean_text(row.accident_type).unwrap_or_else(|| UNSPECIFIED.to_string()),
        weather_condition: clean_text(row.weather).unwrap_or_else(|| UNSPECIFIED.to_string()),
        death_count: parse_count(row.deaths.as_deref()),
        serious_injury_count: parse_count(row.serious_injuries.as_deref()),
        minor_injury_count: parse_count(row.minor_injuries.as_deref()),
        total_injury_count: parse_count(row.total_injuries.as_deref()),
        vehicles,
        ..AccidentRecord::on(occurred_on, source_year_tag)
    }
}
