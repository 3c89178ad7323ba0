//! Parallel min/mean/max aggregation of `name;temperature` records.
//!
//! The input buffer is cut into newline-aligned chunks, each chunk is parsed
//! on its own worker into a private [`StationTable`], the tables are merged
//! once every worker is done, and the merged table becomes a sorted
//! [`Report`].

use std::time::Instant;

use anyhow::{ensure, Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

pub mod chunk;
pub mod merge;
pub mod report;
pub mod station;
pub mod table;
pub mod worker;

pub use chunk::plan_chunks;
pub use merge::merge_tables;
pub use report::{round_tenths, Report, ReportEntry, Tenths};
pub use station::{StationName, StationStats, MAX_NAME_LEN};
pub use table::{StationTable, DEFAULT_CAPACITY};
pub use worker::aggregate_range;

pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of worker threads, and of chunks.
    pub workers: usize,
    /// Initial slot count of every station table.
    pub table_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            table_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.workers >= 1, "worker count must be at least 1");
        ensure!(
            self.table_capacity >= 2 && self.table_capacity.is_power_of_two(),
            "table capacity must be a power of two of at least 2, got {}",
            self.table_capacity
        );
        Ok(())
    }
}

/// Runs the parse and merge phases and returns the merged table.
pub fn aggregate_table(data: &[u8], config: &Config) -> Result<StationTable> {
    config.validate()?;

    let started = Instant::now();
    let ranges = plan_chunks(data, config.workers);
    debug!(
        bytes = data.len(),
        workers = config.workers,
        chunks = ?ranges,
        "planned chunks"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("brc-worker-{i}"))
        .build()
        .context("creating worker pool")?;

    let capacity = config.table_capacity;
    let tables = pool.install(|| {
        ranges
            .into_par_iter()
            .map(|range| aggregate_range(data, range, capacity))
            .collect::<Result<Vec<_>>>()
    })?;
    debug!(elapsed = ?started.elapsed(), "workers finished");

    let merge_started = Instant::now();
    let global = merge_tables(tables, capacity)?;
    debug!(
        elapsed = ?merge_started.elapsed(),
        stations = global.len(),
        "tables merged"
    );
    Ok(global)
}

/// Aggregates `data` into the final sorted report.
pub fn aggregate(data: &[u8], config: &Config) -> Result<Report> {
    let started = Instant::now();
    let table = aggregate_table(data, config)?;

    let report_started = Instant::now();
    let report = Report::from_table(table);
    debug!(elapsed = ?report_started.elapsed(), "report built");

    info!(
        stations = report.len(),
        records = report.total_count(),
        elapsed = ?started.elapsed(),
        "aggregation finished"
    );
    Ok(report)
}
