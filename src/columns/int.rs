use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_ints, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec, ColumnKind, ItemCheck};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
}

impl IntType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Int8" => IntType::Int8,
            "Int16" => IntType::Int16,
            "Int32" => IntType::Int32,
            "Int64" => IntType::Int64,
            "UInt8" => IntType::UInt8,
            "UInt16" => IntType::UInt16,
            "UInt32" => IntType::UInt32,
            "UInt64" => IntType::UInt64,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            IntType::Int8 => "Int8",
            IntType::Int16 => "Int16",
            IntType::Int32 => "Int32",
            IntType::Int64 => "Int64",
            IntType::UInt8 => "UInt8",
            IntType::UInt16 => "UInt16",
            IntType::UInt32 => "UInt32",
            IntType::UInt64 => "UInt64",
        }
    }

    /// Width in bytes.
    pub fn size(self) -> usize {
        match self {
            IntType::Int8 | IntType::UInt8 => 1,
            IntType::Int16 | IntType::UInt16 => 2,
            IntType::Int32 | IntType::UInt32 => 4,
            IntType::Int64 | IntType::UInt64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntType::Int8 | IntType::Int16 | IntType::Int32 | IntType::Int64
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntColumn {
    int_type: IntType,
}

impl IntColumn {
    pub fn new(int_type: IntType) -> Self {
        IntColumn { int_type }
    }

    pub fn int_type(&self) -> IntType {
        self.int_type
    }

    /// Keep the low `size` bytes of the magnitude and reapply the sign, so
    /// `-300` becomes `-44` in an `Int8` column.
    pub fn truncate(&self, value: i128) -> i128 {
        let mask = (1_u128 << (self.int_type.size() * 8)) - 1;
        // at most 64 bits remain so the cast back cannot wrap
        let magnitude = (value.unsigned_abs() & mask) as i128;
        if value < 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    fn normalize(&self, items: &[Value], strict: bool) -> Result<Vec<i128>, WriteError> {
        items
            .iter()
            .map(|item| match item {
                Value::Null => Ok(0),
                Value::Int(n) if strict => Ok(self.truncate(*n)),
                Value::Int(n) => Ok(*n),
                other => Err(PackError::not_packable(other, self.int_type.name()).into()),
            })
            .collect()
    }
}

fn check_unsigned(kind: &ColumnKind, value: &Value) -> Result<(), WriteError> {
    match (kind, value) {
        (ColumnKind::Int(_), Value::Int(n)) if *n < 0 => {
            Err(WriteError::type_mismatch(value, &kind.ch_type()))
        }
        _ => Ok(()),
    }
}

macro_rules! read_as {
    ($ty: ty, $n: expr, $nulls: expr, $buf: expr) => {
        convert_rows(unpack_all::<$ty, _>($n, $buf)?, $nulls, |_, v| {
            Ok(Value::Int(i128::from(v)))
        })
    };
}

impl Codec for IntColumn {
    fn ch_type(&self) -> String {
        self.int_type.name().to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Int]
    }

    fn null_value(&self) -> Value {
        Value::Int(0)
    }

    fn item_check(&self) -> Option<ItemCheck> {
        if self.int_type.is_signed() {
            None
        } else {
            Some(check_unsigned)
        }
    }

    fn write_items(
        &self,
        items: &[Value],
        strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let items = self.normalize(items, strict)?;
        match self.int_type {
            IntType::Int8 => pack_ints::<i8>(&items, out),
            IntType::Int16 => pack_ints::<i16>(&items, out),
            IntType::Int32 => pack_ints::<i32>(&items, out),
            IntType::Int64 => pack_ints::<i64>(&items, out),
            IntType::UInt8 => pack_ints::<u8>(&items, out),
            IntType::UInt16 => pack_ints::<u16>(&items, out),
            IntType::UInt32 => pack_ints::<u32>(&items, out),
            IntType::UInt64 => pack_ints::<u64>(&items, out),
        }?;
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        match self.int_type {
            IntType::Int8 => read_as!(i8, n_items, nulls, buf),
            IntType::Int16 => read_as!(i16, n_items, nulls, buf),
            IntType::Int32 => read_as!(i32, n_items, nulls, buf),
            IntType::Int64 => read_as!(i64, n_items, nulls, buf),
            IntType::UInt8 => read_as!(u8, n_items, nulls, buf),
            IntType::UInt16 => read_as!(u16, n_items, nulls, buf),
            IntType::UInt32 => read_as!(u32, n_items, nulls, buf),
            IntType::UInt64 => read_as!(u64, n_items, nulls, buf),
        }
    }
}
