use uuid::Uuid;

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_all, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec};

/// UUIDs as two little-endian 64 bit words, high word first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UuidColumn;

impl UuidColumn {
    pub fn new() -> Self {
        UuidColumn
    }
}

fn as_u128(item: &Value) -> Result<u128, WriteError> {
    match item {
        Value::Null => Ok(0),
        Value::Uuid(u) => Ok(u.as_u128()),
        Value::Str(s) => Uuid::parse_str(s)
            .map(|u| u.as_u128())
            .map_err(|_| WriteError::CannotParseUuid(s.clone())),
        other => Err(PackError::not_packable(other, "UUID").into()),
    }
}

impl Codec for UuidColumn {
    fn ch_type(&self) -> String {
        "UUID".to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Str, ValueKind::Uuid]
    }

    fn null_value(&self) -> Value {
        Value::Uuid(Uuid::nil())
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let mut words = Vec::with_capacity(items.len() * 2);
        for item in items {
            let value = as_u128(item)?;
            words.push((value >> 64) as u64);
            words.push(value as u64);
        }
        pack_all(&words, out);
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        let words = unpack_all::<u64, _>(n_items.saturating_mul(2), buf)?;
        let raw = words
            .chunks_exact(2)
            .map(|pair| (u128::from(pair[0]) << 64) | u128::from(pair[1]))
            .collect::<Vec<_>>();
        convert_rows(raw, nulls, |_, value| Ok(Value::Uuid(Uuid::from_u128(value))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SliceBuffer;

    #[test]
    fn high_word_is_written_first() {
        let mut out = Vec::new();
        UuidColumn
            .write_items(&[Value::Uuid(Uuid::from_u128(1))], true, &mut out)
            .unwrap();
        let mut expected = vec![0_u8; 8];
        expected.push(1);
        expected.resize(16, 0);
        assert_eq!(out, expected);
    }

    #[test]
    fn text_is_parsed() {
        let text = "c0fcbba9-0752-44ed-a5d6-4dfb4342b89d";
        let mut out = Vec::new();
        UuidColumn
            .write_items(&[Value::str(text)], true, &mut out)
            .unwrap();
        let mut buf = SliceBuffer::from(out);
        let values = UuidColumn.read_items(1, None, &mut buf).unwrap();
        assert_eq!(values, vec![Value::Uuid(Uuid::parse_str(text).unwrap())]);
    }

    #[test]
    fn bad_text_is_reported() {
        let err = UuidColumn
            .write_items(&[Value::str("nope")], true, &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot parse uuid 'nope'");
    }
}
