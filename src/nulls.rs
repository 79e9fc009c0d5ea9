//! The per-row null map that prefixes the payload of a `Nullable(T)` column.

use crate::buffer::{BufferError, ReadBuffer};
use crate::value::Value;

/// One byte per row, `1` for null and `0` otherwise.
pub fn write_nulls_map(items: &[Value], out: &mut Vec<u8>) {
    out.extend(items.iter().map(|item| u8::from(item.is_null())));
}

/// Any non-zero byte marks a null row.
pub fn read_nulls_map<R: ReadBuffer + ?Sized>(
    n_items: usize,
    buf: &mut R,
) -> Result<Vec<bool>, BufferError> {
    Ok(buf.read(n_items)?.iter().map(|b| *b != 0).collect())
}
