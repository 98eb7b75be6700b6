//! Subaru Car Control CLI
//!
//! Replays a TOML scenario through the car controller and prints the CAN
//! frames each cycle would put on the bus.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use subaru_carcontrol::signals::subaru;
use subaru_carcontrol::CanPacker;

mod config;
mod replay;
mod report;

use config::OutputFormat;

/// Subaru Car Control - Replay control scenarios offline
#[derive(Parser, Debug)]
#[command(name = "carcontrol-cli")]
#[command(about = "Replay Subaru car-controller scenarios and list the emitted frames", long_about = None)]
#[command(version)]
struct Args {
    /// Path to scenario file (scenario.toml)
    #[arg(short, long, value_name = "FILE")]
    scenario: PathBuf,

    /// Output format (overrides [output] format in the scenario)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print decoded signal values under each frame
    #[arg(long)]
    decode: bool,

    /// Maximum number of cycles to run
    #[arg(long, value_name = "COUNT")]
    max_cycles: Option<u64>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Subaru Car Control CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using carcontrol library v{}", subaru_carcontrol::VERSION);

    let scenario = config::load_scenario(&args.scenario)?;
    log::info!(
        "Loaded scenario {:?}: {} entries, {} cycles",
        args.scenario,
        scenario.cycles.len(),
        scenario.total_cycles()
    );

    let records = replay::run(&scenario, args.max_cycles)?;

    let db = subaru::global_platform();
    let format = args.format.unwrap_or(scenario.output.format);
    let rendered = match format {
        OutputFormat::Txt => {
            let decode = args.decode || scenario.output.decode_signals;
            report::render_txt(&records, &CanPacker::subaru_global(), &db, decode)?
        }
        OutputFormat::Json => report::render_json(&records, &db)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args()))
        .init();
}
