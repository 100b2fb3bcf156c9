//! Binary entry point for the rlestore CLI.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rlestore::cli::commands::{
    run_build, run_dump, run_inspect, run_runs, BuildConfig, DumpRange, RunEntry,
};
use rlestore::logging::init_logging;
use tracing::debug;

use config::CliConfig;
use ui::Ui;

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(
    name = "rlestore",
    version,
    about = "Build and inspect run-length encoded store files",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "RLESTORE_CONFIG",
        help = "Path to cli.toml (defaults to the user config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        env = "RLESTORE_LOG",
        help = "Tracing filter, e.g. info or rlestore=debug"
    )]
    log_level: Option<String>,

    #[arg(long, global = true, help = "Disable ANSI colours in text output")]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Build a store from text lines")]
    Build {
        #[arg(value_name = "OUT")]
        out: PathBuf,
        #[arg(long, value_name = "FILE", help = "Input file (defaults to stdin)")]
        input: Option<PathBuf>,
        #[arg(long, help = "Parse numbers, booleans, and empty lines")]
        typed: bool,
    },
    #[command(about = "Show row and run counts of a store")]
    Inspect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    #[command(about = "Print rows of a store")]
    Dump {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, default_value_t = 0, help = "First row to print")]
        start: u64,
        #[arg(long, help = "Maximum number of rows to print")]
        limit: Option<u64>,
    },
    #[command(about = "Print the runs backing a store")]
    Runs {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    let level = cli
        .log_level
        .as_deref()
        .or_else(|| config.log_level())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level)?;
    debug!(config = ?config.path(), "cli config loaded");

    let limits = config.decode_limits();
    let ui = Ui::new(!cli.no_color);

    match cli.command {
        Command::Build { out, input, typed } => {
            let stats = run_build(&BuildConfig {
                out: out.clone(),
                input,
                typed,
            })?;
            emit(cli.format, &stats, || {
                ui.success(&format!(
                    "wrote {} rows in {} runs to {}",
                    stats.rows,
                    stats.runs,
                    out.display()
                ))
            })?;
        }
        Command::Inspect { path } => {
            let report = run_inspect(&path, limits)?;
            emit(cli.format, &report, || {
                ui.section(
                    "Store",
                    [
                        ("path", report.path.display().to_string()),
                        ("size_bytes", report.size_bytes.to_string()),
                        ("rows", report.stats.rows.to_string()),
                        ("runs", report.stats.runs.to_string()),
                        (
                            "rows_per_run",
                            format!("{:.2}", report.stats.compression_ratio),
                        ),
                    ],
                )
            })?;
        }
        Command::Dump { path, start, limit } => {
            let format = cli.format;
            let mut failure = None;
            run_dump(&path, limits, DumpRange { start, limit }, |row, value| {
                if failure.is_some() {
                    return;
                }
                match format {
                    OutputFormat::Text => ui.row(row, &[value]),
                    OutputFormat::Json => {
                        let line = serde_json::json!({ "row": row, "value": value.to_json() });
                        match serde_json::to_string(&line) {
                            Ok(text) => println!("{text}"),
                            Err(err) => failure = Some(err),
                        }
                    }
                }
            })?;
            if let Some(err) = failure {
                return Err(err.into());
            }
        }
        Command::Runs { path } => {
            for run in run_runs(&path, limits)? {
                match cli.format {
                    OutputFormat::Text => {
                        ui.row(run.start_row, &[run.length.to_string(), run.value.to_string()])
                    }
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string(&RunEntry::from(&run))?)
                    }
                }
            }
        }
    }
    Ok(())
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
