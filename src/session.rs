// Menu-driven session. Every filter change triggers one recomputation; the
// last bundle is kept so an export never writes results for an older filter.
//
// End of input counts as choosing exit, at the main menu or at any prompt.
use crate::engine::Engine;
use crate::output;
use crate::types::{Bundle, FilterState, Statistic};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub out_dir: PathBuf,
    pub preview_rows: usize,
}

/// Print `prompt` and read one trimmed line. `None` once input is exhausted
/// or unreadable.
fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> io::Result<Option<String>> {
    write!(out, "{}", prompt)?;
    out.flush()?;
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => Ok(None),
        Ok(_) => Ok(Some(buf.trim().to_string())),
    }
}

fn choose_statistic<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    current: Statistic,
) -> io::Result<Option<Statistic>> {
    writeln!(out, "Select statistic:")?;
    for (i, statistic) in Statistic::ALL.iter().enumerate() {
        writeln!(out, "[{}] {}", i + 1, statistic.label())?;
    }
    let Some(choice) = read_line(input, out, "Enter choice: ")? else {
        return Ok(None);
    };
    match choice.parse::<usize>() {
        Ok(n) if (1..=Statistic::ALL.len()).contains(&n) => Ok(Some(Statistic::ALL[n - 1])),
        _ => {
            writeln!(out, "Invalid choice. Keeping {}.\n", current.label())?;
            Ok(Some(current))
        }
    }
}

fn choose_provinces<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    known: &[String],
) -> io::Result<Option<Vec<String>>> {
    let Some(line) = read_line(input, out, "Provinces (comma-separated, blank for all): ")? else {
        return Ok(None);
    };
    let mut chosen = Vec::new();
    for p in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !known.iter().any(|k| k == p) {
            writeln!(out, "Note: no records for province {}.", p)?;
        }
        chosen.push(p.to_string());
    }
    Ok(Some(chosen))
}

/// Export `bundle` and report the outcome on `out`; a failed export is
/// reported, not returned.
pub fn export<W: Write>(out: &mut W, bundle: &Bundle, config: &SessionConfig) -> io::Result<()> {
    match output::export_bundle(&config.out_dir, bundle) {
        Ok(paths) => writeln!(
            out,
            "(Bundle exported to {}, {} files)\n",
            config.out_dir.display(),
            paths.len()
        ),
        Err(e) => writeln!(out, "Write error: {}", e),
    }
}

/// Run the menu until the user exits or input runs out. Returns the filter
/// in effect at the end.
pub fn run<R: BufRead, W: Write>(
    engine: &Engine,
    mut filter: FilterState,
    config: &SessionConfig,
    input: &mut R,
    out: &mut W,
) -> io::Result<FilterState> {
    let provinces = engine.store().provinces();
    let mut last = engine.recompute(&filter);
    output::write_bundle_preview(out, &last, config.preview_rows)?;
    loop {
        writeln!(out, "[1] Choose statistic")?;
        writeln!(out, "[2] Choose provinces")?;
        writeln!(out, "[3] List provinces")?;
        writeln!(out, "[4] Export reports")?;
        writeln!(out, "[0] Exit\n")?;
        let choice = read_line(input, out, "Enter choice: ")?;
        match choice.as_deref() {
            Some("1") => match choose_statistic(input, out, filter.statistic)? {
                Some(statistic) => filter.statistic = statistic,
                None => break,
            },
            Some("2") => match choose_provinces(input, out, &provinces)? {
                Some(chosen) => filter.provinces = chosen.into_iter().collect(),
                None => break,
            },
            Some("3") => {
                writeln!(out, "{}\n", provinces.join(", "))?;
                continue;
            }
            Some("4") => {
                if !last.is_current_for(&filter) {
                    last = engine.recompute(&filter);
                }
                export(out, &last, config)?;
                continue;
            }
            Some("0") | None => break,
            Some(_) => {
                writeln!(out, "Invalid choice.\n")?;
                continue;
            }
        }
        last = engine.recompute(&filter);
        output::write_bundle_preview(out, &last, config.preview_rows)?;
    }
    writeln!(out, "Exiting the program.")?;
    Ok(filter)
}
