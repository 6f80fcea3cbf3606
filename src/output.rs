use crate::error::OutputError;
use crate::types::{AggregateResult, Bundle, ResultData};
use log::info;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write `bundle.json` plus one CSV per view into `dir`. Returns the paths
/// written, JSON first.
pub fn export_bundle(dir: impl AsRef<Path>, bundle: &Bundle) -> Result<Vec<PathBuf>, OutputError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(bundle.results.len() + 1);

    let json = dir.join("bundle.json");
    write_json(&json, bundle)?;
    written.push(json);

    for result in &bundle.results {
        let path = dir.join(format!("{}.csv", result.view.name()));
        // Placeholders have no rows; the JSON carries their message. A CSV
        // left by an earlier export would contradict it.
        if result.is_placeholder() {
            match std::fs::remove_file(&path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => continue,
            }
        }
        write_csv(&path, &result.rows())?;
        written.push(path);
    }
    info!("exported {} files to {}", written.len(), dir.display());
    Ok(written)
}

/// Render the first `max_rows` rows of a result as a Markdown table.
pub fn render_preview(result: &AggregateResult, max_rows: usize) -> String {
    if let ResultData::Placeholder { message } = &result.data {
        return format!("({})", message);
    }
    let rows: Vec<_> = result.rows().into_iter().take(max_rows).collect();
    render_rows(&rows)
}

pub fn render_rows<T: Tabled>(rows: &[T]) -> String
where
    T: Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn write_preview<W: Write>(out: &mut W, result: &AggregateResult, max_rows: usize) -> io::Result<()> {
    writeln!(out, "{}", result.title)?;
    if let ResultData::YearSeries {
        axis_range: Some(range),
        ..
    } = &result.data
    {
        writeln!(out, "(values in thousands, axis {:.3} to {:.3})", range.min, range.max)?;
    }
    writeln!(out)?;
    writeln!(out, "{}\n", render_preview(result, max_rows))
}

/// Preview every view of a bundle, in bundle order.
pub fn write_bundle_preview<W: Write>(out: &mut W, bundle: &Bundle, max_rows: usize) -> io::Result<()> {
    for result in &bundle.results {
        write_preview(out, result, max_rows)?;
    }
    Ok(())
}
