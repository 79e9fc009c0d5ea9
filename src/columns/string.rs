use std::borrow::Cow;

use crate::buffer::{write_varint, BufferError, ReadBuffer, MAX_ALLOCATION};
use crate::error::{ReadError, WriteError};
use crate::pack::PackError;
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec};

const TEXT: &[ValueKind] = &[ValueKind::Str];
const RAW: &[ValueKind] = &[ValueKind::Bytes];

/// The bytes an item is written as. Text is written as UTF-8.
fn item_bytes<'a>(item: &'a Value, ch_type: &'static str) -> Result<Cow<'a, [u8]>, WriteError> {
    match item {
        Value::Null => Ok(Cow::Borrowed(&[][..])),
        Value::Str(s) => Ok(Cow::Borrowed(s.as_bytes())),
        Value::Bytes(b) => Ok(Cow::Borrowed(b.as_slice())),
        other => Err(PackError::not_packable(other, ch_type).into()),
    }
}

/// Variable length strings, each prefixed by its varint byte length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringColumn {
    as_bytes: bool,
}

impl StringColumn {
    pub fn new(as_bytes: bool) -> Self {
        StringColumn { as_bytes }
    }

    /// Whether items are decoded as raw bytes rather than text.
    pub fn as_bytes(&self) -> bool {
        self.as_bytes
    }
}

impl Codec for StringColumn {
    fn ch_type(&self) -> String {
        "String".to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        if self.as_bytes {
            RAW
        } else {
            TEXT
        }
    }

    fn null_value(&self) -> Value {
        if self.as_bytes {
            Value::Bytes(Vec::new())
        } else {
            Value::Str(String::new())
        }
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let items = items
            .iter()
            .map(|item| item_bytes(item, "String"))
            .collect::<Result<Vec<_>, _>>()?;
        for item in items {
            write_varint(out, item.len() as u64);
            out.extend_from_slice(&item);
        }
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        let raw = buf.read_strings(n_items)?;
        convert_rows(raw, nulls, |row, bytes| {
            if self.as_bytes {
                Ok(Value::Bytes(bytes))
            } else {
                String::from_utf8(bytes)
                    .map(Value::Str)
                    .map_err(|_| ReadError::InvalidUtf8 { row })
            }
        })
    }
}

/// Strings in a fixed-size, zero-padded slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStringColumn {
    length: usize,
    as_bytes: bool,
}

impl FixedStringColumn {
    pub fn new(length: usize, as_bytes: bool) -> Self {
        FixedStringColumn { length, as_bytes }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn as_bytes(&self) -> bool {
        self.as_bytes
    }

    /// Copy every item into its own zero-padded slot.
    pub(crate) fn write_slots<'a, I>(&self, items: I, out: &mut Vec<u8>) -> Result<(), WriteError>
    where
        I: IntoIterator<Item = (Cow<'a, [u8]>, &'a Value)>,
    {
        let mut packed = Vec::new();
        for (bytes, item) in items {
            if bytes.len() > self.length {
                return Err(WriteError::ValueTooLarge {
                    value: item.to_string(),
                    len: bytes.len(),
                    width: self.length,
                });
            }
            let start = packed.len();
            packed.resize(start + self.length, 0);
            packed[start..start + bytes.len()].copy_from_slice(&bytes);
        }
        out.extend_from_slice(&packed);
        Ok(())
    }

    pub(crate) fn read_slots<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        buf: &mut R,
    ) -> Result<Vec<Vec<u8>>, BufferError> {
        if self.length == 0 {
            // nothing is read, so the row count alone bounds the allocation
            let maximum = MAX_ALLOCATION / std::mem::size_of::<Vec<u8>>();
            if n_items > maximum {
                return Err(BufferError::OverlargeAllocation {
                    attempted: n_items,
                    maximum,
                });
            }
            return Ok(vec![Vec::new(); n_items]);
        }
        let size = n_items
            .checked_mul(self.length)
            .ok_or(BufferError::OverlargeAllocation {
                attempted: usize::MAX,
                maximum: usize::MAX / self.length,
            })?;
        Ok(buf
            .read(size)?
            .chunks_exact(self.length)
            .map(<[u8]>::to_vec)
            .collect())
    }
}

impl Codec for FixedStringColumn {
    fn ch_type(&self) -> String {
        format!("FixedString({})", self.length)
    }

    fn accepts(&self) -> &'static [ValueKind] {
        if self.as_bytes {
            RAW
        } else {
            TEXT
        }
    }

    fn null_value(&self) -> Value {
        if self.as_bytes {
            Value::Bytes(Vec::new())
        } else {
            Value::Str(String::new())
        }
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let slots = items
            .iter()
            .map(|item| item_bytes(item, "FixedString").map(|bytes| (bytes, item)))
            .collect::<Result<Vec<_>, _>>()?;
        self.write_slots(slots, out)
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        let slots = self.read_slots(n_items, buf)?;
        convert_rows(slots, nulls, |_, mut slot| {
            if self.as_bytes {
                return Ok(Value::Bytes(slot));
            }
            let len = slot.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            slot.truncate(len);
            Ok(match String::from_utf8(slot) {
                Ok(s) => Value::Str(s),
                Err(e) => Value::Bytes(e.into_bytes()),
            })
        })
    }
}
