// Entry point and CLI flow.
//
// Without `--interactive` the binary loads both years, recomputes the views
// once for the filter given on the command line, prints previews and exports
// the bundle. With `--interactive` it runs a menu where every filter change
// triggers a fresh recomputation.
use clap::Parser;
use log::info;
use road_accident_report::session::{self, SessionConfig};
use road_accident_report::types::{FilterState, Statistic, View};
use road_accident_report::{loader, output, util, Engine};
use std::error::Error;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "road_accident_report", version, about = "Road accident summary views 2021-2022")]
struct Args {
    /// CSV file with the 2021 records.
    #[arg(long = "data-2021", default_value = "accident2021.csv")]
    data_2021: PathBuf,

    /// CSV file with the 2022 records.
    #[arg(long = "data-2022", default_value = "accident2022.csv")]
    data_2022: PathBuf,

    /// Statistic measured by the monthly trend.
    #[arg(long, value_enum, default_value_t = Statistic::Accidents)]
    statistic: Statistic,

    /// Restrict to a province; repeat for several.
    #[arg(long = "province")]
    provinces: Vec<String>,

    /// Directory that receives bundle.json and the per-view CSV files.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Rows shown per view in the console preview.
    #[arg(long, default_value_t = 3)]
    preview_rows: usize,

    /// Run every pipeline on the main thread.
    #[arg(long)]
    sequential: bool,

    /// Menu-driven session instead of a single run.
    #[arg(long)]
    interactive: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let args = Args::parse();

    let (store, report) = loader::load_store(&args.data_2021, &args.data_2022)?;
    println!(
        "Processing dataset... ({} rows read, {} kept)",
        util::format_int(report.total_rows()),
        util::format_int(report.kept_rows())
    );
    if report.bad_dates() > 0 {
        println!(
            "Note: {} rows skipped due to unparsable dates.",
            util::format_int(report.bad_dates())
        );
    }
    if report.malformed_rows() > 0 {
        println!(
            "Note: {} rows skipped as malformed CSV.",
            util::format_int(report.malformed_rows())
        );
    }
    println!();

    let mut engine = Engine::new(store);
    if args.sequential {
        engine = engine.sequential();
    }
    info!(
        "{} records, {} provinces, {} views",
        engine.store().len(),
        engine.store().provinces().len(),
        View::ALL.len()
    );

    let filter = FilterState::new(args.statistic).with_provinces(args.provinces.clone());
    let config = SessionConfig {
        out_dir: args.out_dir.clone(),
        preview_rows: args.preview_rows,
    };
    let mut stdout = io::stdout();
    if args.interactive {
        session::run(&engine, filter, &config, &mut io::stdin().lock(), &mut stdout)?;
    } else {
        let bundle = engine.recompute(&filter);
        output::write_bundle_preview(&mut stdout, &bundle, config.preview_rows)?;
        session::export(&mut stdout, &bundle, &config)?;
    }
    Ok(())
}
