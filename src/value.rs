use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use smol_str::SmolStr;
use uuid::Uuid;

/// A single in-memory column item.
///
/// Integers are held as `i128` so every `Int*`/`UInt*` width, and the
/// out-of-range inputs that strict checking truncates, have a home.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i128),
    Float(f64),
    Decimal(BigDecimal),
    Str(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    /// A timestamp with no timezone attached
    DateTime(NaiveDateTime),
    /// A timestamp carrying its own UTC offset
    DateTimeTz(DateTime<FixedOffset>),
    Uuid(Uuid),
    Enum(EnumValue),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// A list-like sequence
    Array(Vec<Value>),
    /// A tuple-like sequence
    Tuple(Vec<Value>),
}

/// A named enumeration constant, the typed counterpart of a bare enum name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub name: SmolStr,
    pub value: i16,
}

impl EnumValue {
    pub fn new<S: Into<SmolStr>>(name: S, value: i16) -> Self {
        EnumValue {
            name: name.into(),
            value,
        }
    }
}

/// The runtime type of a [`Value`], used to describe which inputs a column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Int,
    Float,
    Decimal,
    Str,
    Bytes,
    Date,
    DateTime,
    DateTimeTz,
    Uuid,
    Enum,
    Ipv4,
    Ipv6,
    Array,
    Tuple,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Str => "str",
            ValueKind::Bytes => "bytes",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::DateTimeTz => "datetime with timezone",
            ValueKind::Uuid => "uuid",
            ValueKind::Enum => "enum",
            ValueKind::Ipv4 => "ipv4",
            ValueKind::Ipv6 => "ipv6",
            ValueKind::Array => "array",
            ValueKind::Tuple => "tuple",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Str(_) => ValueKind::Str,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::DateTimeTz(_) => ValueKind::DateTimeTz,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Enum(_) => ValueKind::Enum,
            Value::Ipv4(_) => ValueKind::Ipv4,
            Value::Ipv6(_) => ValueKind::Ipv6,
            Value::Array(_) => ValueKind::Array,
            Value::Tuple(_) => ValueKind::Tuple,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn str(s: &str) -> Value {
        Value::Str(s.into())
    }

    pub fn int<I: Into<i128>>(n: I) -> Value {
        Value::Int(n.into())
    }

    pub fn bytes<B: Into<Vec<u8>>>(b: B) -> Value {
        Value::Bytes(b.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(d) => write!(f, "{}", d),
            Value::DateTimeTz(d) => write!(f, "{}", d),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Enum(e) => write!(f, "{}", e.name),
            Value::Ipv4(a) => write!(f, "{}", a),
            Value::Ipv6(a) => write!(f, "{}", a),
            Value::Array(items) => write!(f, "[{}]", items.iter().format(", ")),
            Value::Tuple(items) => write!(f, "({})", items.iter().format(", ")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

macro_rules! impl_from_int {
    ($($ty: ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Int(i128::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::DateTime(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(d: DateTime<FixedOffset>) -> Self {
        Value::DateTimeTz(d)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(a: Ipv4Addr) -> Self {
        Value::Ipv4(a)
    }
}

impl From<Ipv6Addr> for Value {
    fn from(a: Ipv6Addr) -> Self {
        Value::Ipv6(a)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
