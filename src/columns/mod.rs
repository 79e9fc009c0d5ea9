//! The concrete column kinds.
//!
//! Every kind knows its ClickHouse type name, which value kinds it accepts,
//! the value it writes in place of a null, how to normalize a batch of items
//! into fixed-width primitives and how to turn decoded primitives back into
//! [`Value`]s. [`ColumnKind`] is the closed set of kinds and dispatches to
//! them; the shared write/read flow lives in [`crate::Column`].

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::value::{Value, ValueKind};

mod date;
mod datetime;
mod decimal;
mod enums;
mod float;
mod int;
mod ip;
mod string;
mod uuids;

pub use date::DateColumn;
pub use datetime::DateTimeColumn;
pub use decimal::{join_int128, split_int128, DecimalColumn, DecimalStorage};
pub use enums::{EnumColumn, EnumTable, EnumType};
pub use float::{FloatColumn, FloatType};
pub use int::{IntColumn, IntType};
pub use ip::{Ipv4Column, Ipv6Column};
pub use string::{FixedStringColumn, StringColumn};
pub use uuids::UuidColumn;

/// An extra per-item validation run after the type check when strict
/// checking is enabled. Attached to a column when it is constructed.
pub type ItemCheck = fn(&ColumnKind, &Value) -> Result<(), WriteError>;

pub(crate) trait Codec {
    fn ch_type(&self) -> String;

    fn accepts(&self) -> &'static [ValueKind];

    fn null_value(&self) -> Value;

    fn item_check(&self) -> Option<ItemCheck> {
        None
    }

    /// Normalize `items` and append their packed payload to `out`. Nulls have
    /// already been vetted by the caller and are written as the kind's
    /// sentinel.
    fn write_items(&self, items: &[Value], strict: bool, out: &mut Vec<u8>)
        -> Result<(), WriteError>;

    /// Decode `n_items` values. Rows marked in `nulls` come back as
    /// [`Value::Null`] without being converted.
    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Int(IntColumn),
    Float(FloatColumn),
    Date(DateColumn),
    DateTime(DateTimeColumn),
    Decimal(DecimalColumn),
    String(StringColumn),
    FixedString(FixedStringColumn),
    Enum(EnumColumn),
    Uuid(UuidColumn),
    Ipv4(Ipv4Column),
    Ipv6(Ipv6Column),
}

macro_rules! dispatch {
    ($kind: expr, $col: ident => $body: expr) => {
        match $kind {
            ColumnKind::Int($col) => $body,
            ColumnKind::Float($col) => $body,
            ColumnKind::Date($col) => $body,
            ColumnKind::DateTime($col) => $body,
            ColumnKind::Decimal($col) => $body,
            ColumnKind::String($col) => $body,
            ColumnKind::FixedString($col) => $body,
            ColumnKind::Enum($col) => $body,
            ColumnKind::Uuid($col) => $body,
            ColumnKind::Ipv4($col) => $body,
            ColumnKind::Ipv6($col) => $body,
        }
    };
}

impl ColumnKind {
    /// The server-side type name, e.g. `Decimal(18, 4)`.
    pub fn ch_type(&self) -> String {
        dispatch!(self, c => c.ch_type())
    }

    /// The value kinds accepted when strict type checking is on.
    pub fn accepts(&self) -> &'static [ValueKind] {
        dispatch!(self, c => c.accepts())
    }

    /// The value a null stands for in the payload of a nullable column.
    pub fn null_value(&self) -> Value {
        dispatch!(self, c => c.null_value())
    }

    pub(crate) fn item_check(&self) -> Option<ItemCheck> {
        dispatch!(self, c => c.item_check())
    }

    pub(crate) fn write_items(
        &self,
        items: &[Value],
        strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        dispatch!(self, c => c.write_items(items, strict, out))
    }

    pub(crate) fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        dispatch!(self, c => c.read_items(n_items, nulls, buf))
    }
}

macro_rules! impl_from_column {
    ($($variant: ident($ty: ty)),*) => {
        $(
            impl From<$ty> for ColumnKind {
                fn from(c: $ty) -> Self {
                    ColumnKind::$variant(c)
                }
            }
        )*
    };
}

impl_from_column!(
    Int(IntColumn),
    Float(FloatColumn),
    Date(DateColumn),
    DateTime(DateTimeColumn),
    Decimal(DecimalColumn),
    String(StringColumn),
    FixedString(FixedStringColumn),
    Enum(EnumColumn),
    Uuid(UuidColumn),
    Ipv4(Ipv4Column),
    Ipv6(Ipv6Column)
);

/// Convert decoded primitives to values, leaving null rows unconverted.
pub(crate) fn convert_rows<T, F>(
    raw: Vec<T>,
    nulls: Option<&[bool]>,
    mut convert: F,
) -> Result<Vec<Value>, ReadError>
where
    F: FnMut(usize, T) -> Result<Value, ReadError>,
{
    raw.into_iter()
        .enumerate()
        .map(|(row, item)| {
            if nulls.and_then(|n| n.get(row)).copied().unwrap_or(false) {
                Ok(Value::Null)
            } else {
                convert(row, item)
            }
        })
        .collect()
}
