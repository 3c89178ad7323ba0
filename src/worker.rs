use std::ops::Range;

use anyhow::{bail, Result};
use tracing::debug;

use crate::station::MAX_NAME_LEN;
use crate::table::{Fnv1a, StationTable};

/// Parses every `name;temperature` record in `data[range]` into a fresh table.
///
/// Any malformed record fails the whole range; the error names the record's
/// offset in `data`.
pub fn aggregate_range(data: &[u8], range: Range<usize>, capacity: usize) -> Result<StationTable> {
    let base = range.start;
    let bytes = &data[range.clone()];
    let mut table = StationTable::with_capacity(capacity);
    let mut records = 0u64;

    let mut pos = 0;
    while pos < bytes.len() {
        let record_start = base + pos;

        let name_start = pos;
        let mut hasher = Fnv1a::new();
        loop {
            match bytes.get(pos) {
                Some(b';') => break,
                Some(b'\n') | None => {
                    bail!("malformed record at byte {record_start}: missing ';' delimiter")
                }
                Some(&b) => {
                    if pos - name_start == MAX_NAME_LEN {
                        bail!(
                            "malformed record at byte {record_start}: station name longer than {MAX_NAME_LEN} bytes"
                        );
                    }
                    hasher.write_u8(b);
                    pos += 1;
                }
            }
        }
        let name = &bytes[name_start..pos];
        if name.is_empty() {
            bail!("malformed record at byte {record_start}: empty station name");
        }
        pos += 1;

        let Some((value, used)) = parse_temperature(&bytes[pos..]) else {
            let field = &bytes[pos..];
            let field = &field[..memchr::memchr(b'\n', field).unwrap_or(field.len())];
            bail!(
                "malformed record at byte {record_start}: invalid temperature {:?}",
                String::from_utf8_lossy(field)
            );
        };
        pos += used;

        match bytes.get(pos) {
            None => {}
            Some(b'\n') => pos += 1,
            Some(_) => bail!(
                "malformed record at byte {record_start}: unexpected byte after temperature at {}",
                base + pos
            ),
        }

        table.record(hasher.finish(), name, value)?;
        records += 1;
    }

    debug!(
        start = range.start,
        end = range.end,
        records,
        stations = table.len(),
        "chunk parsed"
    );
    Ok(table)
}

/// Parses `[-]D.D` or `[-]DD.D` at the start of `bytes` into tenths of a
/// degree, returning the value and the number of bytes consumed.
pub fn parse_temperature(bytes: &[u8]) -> Option<(i64, usize)> {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    let digit = |i: usize| {
        digits
            .get(i)
            .filter(|b| b.is_ascii_digit())
            .map(|b| i64::from(b - b'0'))
    };

    let (value, len) = if digits.get(1) == Some(&b'.') {
        (digit(0)? * 10 + digit(2)?, 3)
    } else if digits.get(2) == Some(&b'.') {
        (digit(0)? * 100 + digit(1)? * 10 + digit(3)?, 4)
    } else {
        return None;
    };

    let value = if negative { -value } else { value };
    Some((value, len + usize::from(negative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DEFAULT_CAPACITY;

    fn aggregate(data: &[u8]) -> Result<StationTable> {
        aggregate_range(data, 0..data.len(), DEFAULT_CAPACITY)
    }

    #[test]
    fn temperatures() {
        for (input, expected) in [
            ("0.0", Some((0, 3))),
            ("-0.0", Some((0, 4))),
            ("8.9", Some((89, 3))),
            ("12.0", Some((120, 4))),
            ("-3.5", Some((-35, 4))),
            ("-99.9", Some((-999, 5))),
            ("12.3\n", Some((123, 4))),
            ("1", None),
            ("1.", None),
            ("12", None),
            ("123.4", None),
            ("+1.0", None),
            ("a.0", None),
            ("1.a", None),
            ("--1.0", None),
            ("", None),
        ] {
            assert_eq!(parse_temperature(input.as_bytes()), expected, "input `{input}`");
        }
    }

    #[test]
    fn aggregates_records() {
        let table = aggregate(b"Hamburg;12.0\nBulawayo;8.9\nHamburg;10.0\n").unwrap();
        assert_eq!(table.len(), 2);
        let hamburg = table.get(b"Hamburg").unwrap();
        assert_eq!((hamburg.sum, hamburg.count, hamburg.min, hamburg.max), (220, 2, 100, 120));
        assert_eq!(table.get(b"Bulawayo").unwrap().sum, 89);
    }

    #[test]
    fn final_record_may_omit_newline() {
        let table = aggregate(b"Oslo;-3.5\nOslo;-4.0").unwrap();
        let oslo = table.get(b"Oslo").unwrap();
        assert_eq!((oslo.sum, oslo.count, oslo.min, oslo.max), (-75, 2, -40, -35));
    }

    #[test]
    fn only_parses_its_own_range() {
        let data = b"a;1.0\nb;2.0\nc;3.0\n";
        let table = aggregate_range(data, 6..12, 16).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get(b"b").is_some());
    }

    #[test]
    fn empty_range_gives_empty_table() {
        assert!(aggregate(b"").unwrap().is_empty());
    }

    #[test]
    fn utf8_names() {
        let table = aggregate("Zürich;-1.2\nSão Paulo;25.3\n".as_bytes()).unwrap();
        assert_eq!(table.get("Zürich".as_bytes()).unwrap().min, -12);
        assert_eq!(table.get("São Paulo".as_bytes()).unwrap().max, 253);
    }

    #[test]
    fn longest_name_is_accepted() {
        let mut data = vec![b'n'; MAX_NAME_LEN];
        data.extend_from_slice(b";1.0\n");
        let table = aggregate(&data).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn malformed_records_are_rejected() {
        let long_name = format!("{};1.0\n", "n".repeat(MAX_NAME_LEN + 1));
        for (input, message) in [
            ("a;1.0\nb1.0\n", "at byte 6: missing ';'"),
            ("a;1.0\n\n", "at byte 6: missing ';'"),
            ("a;1.0\nb", "at byte 6: missing ';'"),
            (";1.0\n", "at byte 0: empty station name"),
            ("a;1.25\n", "at byte 0: unexpected byte after temperature at 5"),
            ("a;1.0\r\n", "unexpected byte"),
            ("a;x\n", "invalid temperature \"x\""),
            ("a;123.0\n", "invalid temperature"),
            ("a;\n", "invalid temperature"),
            (long_name.as_str(), "longer than 99 bytes"),
        ] {
            let err = aggregate(input.as_bytes()).unwrap_err().to_string();
            assert!(err.contains(message), "input {input:?} gave `{err}`");
        }
    }

    #[test]
    fn offsets_are_absolute() {
        let data = b"a;1.0\nb;2.0\nc;oops\n";
        let err = aggregate_range(data, 12..data.len(), 16).unwrap_err();
        assert!(err.to_string().contains("at byte 12"), "{err}");
    }
}
