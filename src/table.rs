//! Open-addressing aggregation table keyed by station name.
//!
//! Slots hold positions into an entry vector kept in insertion order, so the
//! aggregate storage never depends on how many slots the index has. The slot
//! count doubles before the load factor passes one half, which keeps every
//! linear probe sequence short and guarantees it finds a free slot.

use anyhow::{ensure, Result};
use tracing::debug;

use crate::station::{StationName, StationStats};

/// Slot count of a freshly created table.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

const EMPTY: u32 = u32::MAX;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Incremental 32-bit FNV-1a, fed one byte at a time while a name is scanned.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a(u32);

impl Fnv1a {
    #[inline]
    pub fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.0 ^= u32::from(byte);
        self.0 = self.0.wrapping_mul(FNV_PRIME);
    }

    #[inline]
    pub fn finish(self) -> u32 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hasher = Fnv1a::new();
    for &b in bytes {
        hasher.write_u8(b);
    }
    hasher.finish()
}

#[derive(Debug, Clone)]
struct Entry {
    hash: u32,
    name: StationName,
    stats: StationStats,
}

#[derive(Debug, Clone)]
pub struct StationTable {
    slots: Vec<u32>,
    entries: Vec<Entry>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a table with at least `capacity` slots, rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        Self {
            slots: vec![EMPTY; capacity],
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Adds one measurement for `name`, whose FNV-1a hash is `hash`.
    pub fn record(&mut self, hash: u32, name: &[u8], value: i64) -> Result<()> {
        let mask = self.slots.len() - 1;
        let mut slot = hash as usize & mask;
        loop {
            let pos = self.slots[slot];
            if pos == EMPTY {
                break;
            }
            let entry = &mut self.entries[pos as usize];
            if entry.hash == hash && entry.name.as_bytes() == name {
                entry.stats.update(value);
                return Ok(());
            }
            slot = (slot + 1) & mask;
        }
        let name = StationName::new(name)?;
        self.insert_at(slot, hash, name, StationStats::new(value))
    }

    /// Folds every entry of `other` into this table.
    pub fn merge(&mut self, other: StationTable) -> Result<()> {
        for entry in other.entries {
            self.combine(entry.hash, entry.name, &entry.stats)?;
        }
        Ok(())
    }

    fn combine(&mut self, hash: u32, name: StationName, stats: &StationStats) -> Result<()> {
        let mask = self.slots.len() - 1;
        let mut slot = hash as usize & mask;
        loop {
            let pos = self.slots[slot];
            if pos == EMPTY {
                break;
            }
            let entry = &mut self.entries[pos as usize];
            if entry.hash == hash && entry.name == name {
                entry.stats.combine(stats);
                return Ok(());
            }
            slot = (slot + 1) & mask;
        }
        self.insert_at(slot, hash, name, *stats)
    }

    fn insert_at(
        &mut self,
        mut slot: usize,
        hash: u32,
        name: StationName,
        stats: StationStats,
    ) -> Result<()> {
        ensure!(
            self.entries.len() < EMPTY as usize,
            "station table cannot hold more than {} distinct stations",
            self.entries.len()
        );
        if (self.entries.len() + 1) * 2 > self.slots.len() {
            self.grow();
            slot = free_slot(&self.slots, hash);
        }
        self.slots[slot] = self.entries.len() as u32;
        self.entries.push(Entry { hash, name, stats });
        Ok(())
    }

    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        debug!(
            stations = self.entries.len(),
            capacity, "growing station table"
        );
        self.slots = vec![EMPTY; capacity];
        for (pos, entry) in self.entries.iter().enumerate() {
            let slot = free_slot(&self.slots, entry.hash);
            self.slots[slot] = pos as u32;
        }
    }

    pub fn get(&self, name: &[u8]) -> Option<&StationStats> {
        let hash = fnv1a(name);
        let mask = self.slots.len() - 1;
        let mut slot = hash as usize & mask;
        loop {
            let pos = self.slots[slot];
            if pos == EMPTY {
                return None;
            }
            let entry = &self.entries[pos as usize];
            if entry.hash == hash && entry.name.as_bytes() == name {
                return Some(&entry.stats);
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&StationName, &StationStats)> + '_ {
        self.entries.iter().map(|e| (&e.name, &e.stats))
    }

    pub fn into_entries(self) -> Vec<(StationName, StationStats)> {
        self.entries.into_iter().map(|e| (e.name, e.stats)).collect()
    }
}

impl Default for StationTable {
    fn default() -> Self {
        Self::new()
    }
}

fn free_slot(slots: &[u32], hash: u32) -> usize {
    let mask = slots.len() - 1;
    let mut slot = hash as usize & mask;
    while slots[slot] != EMPTY {
        slot = (slot + 1) & mask;
    }
    slot
}
