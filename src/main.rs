//! pfx2asn - fast concurrent ASN lookup for lists of IP prefixes.
//!
//! This is the command-line interface for the pfx2asn library.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pfx2asn::asn::cache::DEFAULT_CACHE_SIZE;
use pfx2asn::asn::rdap::DEFAULT_RDAP_BASE_URL;
use pfx2asn::config::{DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_WORKERS};
use pfx2asn::table::{self, DEFAULT_OUTPUT_PATH};
use pfx2asn::{Dispatcher, LookupConfig, ProgressReporter, ResultCollector};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Get the version string for pfx2asn
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the lookup tool.
#[derive(Parser, Debug)]
#[clap(author, version = get_version(), about = "Fast ASN lookup for IP prefixes", long_about = None)]
struct Args {
    /// CSV file with a Prefix column
    input_file: PathBuf,

    /// Output file (.json for JSON, CSV otherwise)
    #[clap(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Number of concurrent lookups
    #[clap(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Maximum number of cached prefix lookups
    #[clap(long, default_value_t = DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    /// Timeout for a single prefix lookup in milliseconds
    #[clap(long, default_value_t = DEFAULT_LOOKUP_TIMEOUT_MS)]
    timeout_ms: u64,

    /// RDAP service base URL
    #[clap(long, default_value = DEFAULT_RDAP_BASE_URL)]
    rdap_url: String,

    /// Sort output rows by prefix instead of completion order
    #[clap(long)]
    sort: bool,

    /// Do not draw the progress bar
    #[clap(long)]
    no_progress: bool,

    /// Enable verbose logging on stderr (repeat for more detail)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Progress bar adapter for the dispatcher
struct BarReporter(ProgressBar);

impl ProgressReporter for BarReporter {
    fn on_progress(&self, completed: usize, total: usize) {
        self.0.set_length(total as u64);
        self.0.set_position(completed as u64);
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    if let Err(e) = runtime.block_on(async_main(args)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        eprintln!("{}", "Processing failed".red());
        std::process::exit(1);
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Map command-line flags onto a validated lookup configuration
fn build_config(args: &Args) -> Result<LookupConfig> {
    LookupConfig::builder()
        .workers(args.workers)
        .cache_size(args.cache_size)
        .lookup_timeout(Duration::from_millis(args.timeout_ms))
        .rdap_base_url(&args.rdap_url)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid configuration - {}", e))
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}")
            .expect("Invalid template")
            .progress_chars("=>-"),
    );
    bar.set_message(format!("{}", "Processing".cyan()));
    bar
}

async fn async_main(args: Args) -> Result<()> {
    let config = build_config(&args)?;

    println!("\n{}", "ASN Lookup Tool".yellow());
    println!(
        "{}",
        format!("Workers: {} | Cache: {}", config.workers, config.cache_size).cyan()
    );

    let prefixes = table::read_prefixes(&args.input_file)?;
    tracing::info!(
        "read {} rows from {}",
        prefixes.len(),
        args.input_file.display()
    );

    let dispatcher = Dispatcher::from_config(&config)?;
    let reporter = BarReporter(progress_bar(args.no_progress));
    let records = dispatcher.dispatch(prefixes, &reporter).await;
    let elapsed = reporter.0.elapsed();
    reporter.0.finish_and_clear();

    let mut collector: ResultCollector = records.into_iter().collect();
    if args.sort {
        collector.sort_by_prefix();
    }

    table::write_records(&args.output, collector.records())?;

    let summary = collector.summary();
    println!(
        "\n{}",
        format!(
            "Processed {} prefixes in {:.1}s",
            summary.total,
            elapsed.as_secs_f64()
        )
        .green()
    );
    if summary.failed > 0 {
        println!(
            "{}",
            format!("{} prefixes could not be resolved", summary.failed).yellow()
        );
    }
    println!(
        "{}",
        format!("Results saved to {}", args.output.display()).green()
    );
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
