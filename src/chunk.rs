use std::ops::Range;

use memchr::memchr;

/// Splits `data` into `workers` contiguous ranges that each end right after a
/// newline, except the last one which always ends at `data.len()`.
///
/// The search for a cut point runs forward from the nominal boundary until a
/// newline is found, however long the record is. Once no newline is left the
/// remaining ranges are empty.
pub fn plan_chunks(data: &[u8], workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let len = data.len();
    let stride = len / workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 1..workers {
        let from = (i * stride).max(start);
        let end = match memchr(b'\n', &data[from..]) {
            Some(offset) => from + offset + 1,
            None => len,
        };
        ranges.push(start..end);
        start = end;
    }
    ranges.push(start..len);
    ranges
}
