use anyhow::Result;

use crate::table::StationTable;

/// Folds per-worker tables into one global table. The fold order has no
/// effect on the resulting statistics.
pub fn merge_tables<I>(tables: I, capacity: usize) -> Result<StationTable>
where
    I: IntoIterator<Item = StationTable>,
{
    let mut global = StationTable::with_capacity(capacity);
    for table in tables {
        global.merge(table)?;
    }
    Ok(global)
}
