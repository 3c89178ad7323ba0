use std::cmp::Ordering;
use std::fmt;

use anyhow::{bail, Result};

/// Longest station name accepted, in bytes.
pub const MAX_NAME_LEN: usize = 99;

/// A station name stored inline, 1..=99 bytes.
#[derive(Clone, Copy)]
pub struct StationName {
    len: u8,
    bytes: [u8; MAX_NAME_LEN],
}

impl StationName {
    pub fn new(name: &[u8]) -> Result<Self> {
        if name.is_empty() {
            bail!("empty station name");
        }
        if name.len() > MAX_NAME_LEN {
            bail!(
                "station name is {} bytes long, at most {} are allowed",
                name.len(),
                MAX_NAME_LEN
            );
        }
        let mut bytes = [0u8; MAX_NAME_LEN];
        bytes[..name.len()].copy_from_slice(name);
        Ok(Self {
            len: name.len() as u8,
            bytes,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl PartialEq for StationName {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for StationName {}

impl PartialOrd for StationName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StationName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl fmt::Debug for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Running aggregate for one station. All temperatures are in tenths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationStats {
    pub sum: i64,
    pub count: u64,
    pub min: i64,
    pub max: i64,
}

impl StationStats {
    pub fn new(value: i64) -> Self {
        Self {
            sum: value,
            count: 1,
            min: value,
            max: value,
        }
    }

    pub fn update(&mut self, value: i64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    pub fn combine(&mut self, other: &StationStats) {
        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
        self.sum += other.sum;
        self.count += other.count;
    }
}
