use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use tracing_subscriber::EnvFilter;

use one_brc_parallel::{aggregate, Config, DEFAULT_CAPACITY, DEFAULT_WORKERS};

/// Computes min/mean/max temperature per station from a `name;temperature` file.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Measurements file, one `name;temperature` record per line.
    path: PathBuf,

    /// Number of worker threads.
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    threads: usize,
}

fn run(args: Args) -> Result<()> {
    let config = Config {
        workers: args.threads,
        table_capacity: DEFAULT_CAPACITY,
    };
    config.validate()?;

    let file = File::open(&args.path)
        .with_context(|| format!("opening file '{}'", args.path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("reading size of file '{}'", args.path.display()))?
        .len();

    let report = if size == 0 {
        aggregate(&[], &config)?
    } else {
        // SAFETY: the mapping is read-only and the file is not expected to
        // change while it is being aggregated.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("mapping file '{}'", args.path.display()))?;
        aggregate(&mmap, &config)?
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    report.write_to(&mut out).context("writing report")?;
    out.flush().context("writing report")?;
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
