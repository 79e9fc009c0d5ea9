use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_ints, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec, ColumnKind, FixedStringColumn, ItemCheck};

const IPV6_WIDTH: usize = 16;

/// IPv4 addresses stored as a UInt32 in host order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ipv4Column;

impl Ipv4Column {
    pub fn new() -> Self {
        Ipv4Column
    }
}

fn parse_ipv4(text: &str) -> Result<Ipv4Addr, WriteError> {
    text.parse().map_err(|_| WriteError::CannotParseDomain {
        family: "IPv4",
        text: text.to_string(),
    })
}

fn parse_ipv6(text: &str) -> Result<Ipv6Addr, WriteError> {
    text.parse().map_err(|_| WriteError::CannotParseDomain {
        family: "IPv6",
        text: text.to_string(),
    })
}

fn check_ipv4(kind: &ColumnKind, value: &Value) -> Result<(), WriteError> {
    let valid = match value {
        Value::Int(n) => u32::try_from(*n).is_ok(),
        Value::Str(s) => s.parse::<Ipv4Addr>().is_ok(),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(WriteError::type_mismatch(value, &kind.ch_type()))
    }
}

fn check_ipv6(kind: &ColumnKind, value: &Value) -> Result<(), WriteError> {
    let valid = match value {
        Value::Bytes(b) => b.len() == IPV6_WIDTH,
        Value::Str(s) => s.parse::<Ipv6Addr>().is_ok(),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(WriteError::type_mismatch(value, &kind.ch_type()))
    }
}

impl Codec for Ipv4Column {
    fn ch_type(&self) -> String {
        "IPv4".to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Ipv4, ValueKind::Str, ValueKind::Int]
    }

    fn null_value(&self) -> Value {
        Value::Ipv4(Ipv4Addr::UNSPECIFIED)
    }

    fn item_check(&self) -> Option<ItemCheck> {
        Some(check_ipv4)
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let addrs = items
            .iter()
            .map(|item| match item {
                Value::Null => Ok(0),
                Value::Int(n) => Ok(*n),
                Value::Ipv4(a) => Ok(i128::from(u32::from(*a))),
                Value::Str(s) => Ok(i128::from(u32::from(parse_ipv4(s)?))),
                other => Err(PackError::not_packable(other, "UInt32").into()),
            })
            .collect::<Result<Vec<_>, WriteError>>()?;
        pack_ints::<u32>(&addrs, out)?;
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        convert_rows(unpack_all::<u32, _>(n_items, buf)?, nulls, |_, raw| {
            Ok(Value::Ipv4(Ipv4Addr::from(raw)))
        })
    }
}

/// IPv6 addresses as 16 raw bytes in network order, on top of a
/// `FixedString(16)` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Column {
    slots: FixedStringColumn,
}

impl Default for Ipv6Column {
    fn default() -> Self {
        Ipv6Column::new()
    }
}

impl Ipv6Column {
    pub fn new() -> Self {
        Ipv6Column {
            slots: FixedStringColumn::new(IPV6_WIDTH, true),
        }
    }
}

impl Codec for Ipv6Column {
    fn ch_type(&self) -> String {
        "IPv6".to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Ipv6, ValueKind::Str, ValueKind::Bytes]
    }

    fn null_value(&self) -> Value {
        Value::Ipv6(Ipv6Addr::UNSPECIFIED)
    }

    fn item_check(&self) -> Option<ItemCheck> {
        Some(check_ipv6)
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let slots = items
            .iter()
            .map(|item| -> Result<_, WriteError> {
                let bytes: Cow<'_, [u8]> = match item {
                    Value::Null => Cow::Borrowed(&[][..]),
                    Value::Bytes(b) => Cow::Borrowed(b.as_slice()),
                    Value::Ipv6(a) => Cow::Owned(a.octets().to_vec()),
                    Value::Str(s) => Cow::Owned(parse_ipv6(s)?.octets().to_vec()),
                    other => return Err(PackError::not_packable(other, "IPv6").into()),
                };
                Ok((bytes, item))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.slots.write_slots(slots, out)
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        convert_rows(self.slots.read_slots(n_items, buf)?, nulls, |_, slot| {
            let mut octets = [0_u8; IPV6_WIDTH];
            octets.copy_from_slice(&slot);
            Ok(Value::Ipv6(Ipv6Addr::from(octets)))
        })
    }
}
