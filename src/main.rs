//! Demand-paging simulator - main entry point
//!
//! Usage: demand-paging-sim [OPTIONS] <FILE>
//!
//! The simulation file lists process images followed by a trace of
//! `pid address` pairs. Every access is translated under the chosen
//! replacement strategy and a per-process summary is printed at the end.

mod logger;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use paging_sim::app::{self, RunOptions};
use paging_sim::report::SummaryFormat;
use paging_sim::{ReplacementStrategy, SimConfig, DEFAULT_MAX_FRAMES, NUM_FRAMES};

#[derive(Parser, Debug)]
#[command(name = "demand-paging-sim")]
#[command(about = "Simulate demand paging with FIFO or LRU page replacement")]
#[command(version)]
struct Cli {
    /// Simulation file (process images and access trace)
    file: PathBuf,

    /// Print every access as it is translated
    #[arg(short, long)]
    verbose: bool,

    /// Print the loaded processes and trace before simulating
    #[arg(short, long)]
    file_verbose: bool,

    /// Page replacement strategy (FIFO or LRU)
    #[arg(short, long, default_value_t = ReplacementStrategy::Fifo)]
    strategy: ReplacementStrategy,

    /// Maximum frames a single process may hold
    #[arg(short, long, default_value_t = DEFAULT_MAX_FRAMES)]
    max_frames: usize,

    /// Total physical frames shared by all processes
    #[arg(long, default_value_t = NUM_FRAMES)]
    frames: usize,

    /// Print the summary as CSV
    #[arg(long)]
    csv: bool,

    /// Diagnostic log level written to stderr
    #[arg(short, long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.log_level);

    let opts = RunOptions {
        file: cli.file,
        config: SimConfig {
            num_frames: cli.frames,
            max_frames_per_process: cli.max_frames,
            strategy: cli.strategy,
        },
        verbose: cli.verbose,
        file_verbose: cli.file_verbose,
        format: if cli.csv {
            SummaryFormat::Csv
        } else {
            SummaryFormat::Table
        },
    };

    let stdout = io::stdout();
    match app::run(&opts, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
