//! Binary entrypoint for the `primes` pipeline sieve.
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pipesieve_core::{
    SieveConfig, SieveDriver, WriterSink, DEFAULT_CHANNEL_CAPACITY, DEFAULT_LIMIT,
};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "primes")]
#[command(version, about = "Print primes found by a chain of concurrent filter stages")]
struct Cli {
    /// Largest candidate fed into the pipeline
    #[arg(short = 'n', long, env = "PRIMES_LIMIT", default_value_t = DEFAULT_LIMIT)]
    limit: u32,
    /// Values buffered per channel between stages
    #[arg(long, env = "PRIMES_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    capacity: usize,
    /// Fail once this many stages are alive at the same time
    #[arg(long, value_name = "N")]
    max_workers: Option<usize>,
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
    /// Print the run report as JSON to stderr when done
    #[arg(long)]
    report: bool,
}

impl Cli {
    fn config(&self) -> SieveConfig {
        SieveConfig {
            limit: self.limit,
            channel_capacity: self.capacity,
            max_workers: self.max_workers,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("primes: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let driver = SieveDriver::with_tokio(cli.config(), Arc::new(WriterSink::stdout()))?;
    let report = driver.drive().await?;

    if cli.report {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
