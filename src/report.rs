use std::fmt;
use std::io::{self, Write};

use crate::station::StationName;
use crate::table::StationTable;

/// Rounds a tenths-scaled value to a whole number of tenths.
///
/// Halves round away from zero for positive values but toward zero for
/// negative ones, and negative zero comes out as zero.
pub fn round_tenths(x: f64) -> i64 {
    let truncated = x.trunc();
    let mut rounded = truncated;
    if x < 0.0 && truncated - x == 0.5 {
        // negative halves stay truncated
    } else if (x - truncated).abs() >= 0.5 {
        rounded += x.signum();
    }
    // `as` maps -0.0 to 0
    rounded as i64
}

/// A tenths-scaled value printed with exactly one fractional digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenths(pub i64);

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub name: StationName,
    pub min: Tenths,
    pub mean: Tenths,
    pub max: Tenths,
    pub count: u64,
}

impl ReportEntry {
    pub fn min_degrees(&self) -> f64 {
        self.min.0 as f64 / 10.0
    }

    pub fn mean_degrees(&self) -> f64 {
        self.mean.0 as f64 / 10.0
    }

    pub fn max_degrees(&self) -> f64 {
        self.max.0 as f64 / 10.0
    }
}

/// Final per-station results, sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn from_table(table: StationTable) -> Self {
        let mut stations = table.into_entries();
        stations.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let entries = stations
            .into_iter()
            .map(|(name, stats)| {
                let mean = stats.sum as f64 / stats.count as f64;
                ReportEntry {
                    name,
                    min: Tenths(round_tenths(stats.min as f64)),
                    mean: Tenths(round_tenths(mean)),
                    max: Tenths(round_tenths(stats.max as f64)),
                    count: stats.count,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records that went into the report.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Writes the report line, newline included. Names are written as raw bytes.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        out.write_all(b"{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.write_all(b", ")?;
            }
            out.write_all(entry.name.as_bytes())?;
            write!(out, "={}/{}/{}", entry.min, entry.mean, entry.max)?;
        }
        out.write_all(b"}\n")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}/{}/{}", entry.name, entry.min, entry.mean, entry.max)?;
        }
        f.write_str("}")
    }
}
