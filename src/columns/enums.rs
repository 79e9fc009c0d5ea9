use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_ints, unpack_all};
use crate::resolver::ResolveError;
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumType {
    Enum8,
    Enum16,
}

impl EnumType {
    pub fn name(self) -> &'static str {
        match self {
            EnumType::Enum8 => "Enum8",
            EnumType::Enum16 => "Enum16",
        }
    }

    fn holds(self, value: i16) -> bool {
        match self {
            EnumType::Enum8 => i8::try_from(value).is_ok(),
            EnumType::Enum16 => true,
        }
    }
}

/// The name/value pairs of an enum type in declaration order, indexed both ways.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumTable {
    members: Vec<(SmolStr, i16)>,
    by_name: FxHashMap<SmolStr, i16>,
    by_value: FxHashMap<i16, SmolStr>,
}

impl EnumTable {
    /// Names and values must both be unique.
    pub fn new<I, S>(members: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = (S, i16)>,
        S: Into<SmolStr>,
    {
        let mut table = EnumTable::default();
        for (name, value) in members {
            let name = name.into();
            if table.by_name.contains_key(&name) || table.by_value.contains_key(&value) {
                return Err(ResolveError::DuplicateEnumMember(name.to_string()));
            }
            table.by_name.insert(name.clone(), value);
            table.by_value.insert(value, name.clone());
            table.members.push((name, value));
        }
        Ok(table)
    }

    pub fn value_of(&self, name: &str) -> Option<i16> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, value: i16) -> Option<&SmolStr> {
        self.by_value.get(&value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, i16)> {
        self.members.iter().map(|(name, value)| (name, *value))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumColumn {
    enum_type: EnumType,
    table: EnumTable,
}

impl EnumColumn {
    /// Fails if a member value does not fit the storage width.
    pub fn new(enum_type: EnumType, table: EnumTable) -> Result<Self, ResolveError> {
        if let Some((name, value)) = table.iter().find(|(_, v)| !enum_type.holds(*v)) {
            return Err(ResolveError::EnumValueOutOfRange {
                name: name.to_string(),
                value,
                enum_type: enum_type.name(),
            });
        }
        Ok(EnumColumn { enum_type, table })
    }

    pub fn enum_type(&self) -> EnumType {
        self.enum_type
    }

    pub fn table(&self) -> &EnumTable {
        &self.table
    }

    fn raw_value(&self, item: &Value) -> Result<i16, WriteError> {
        let found = match item {
            Value::Null => return Ok(0),
            Value::Enum(e) => self.table.value_of(&e.name),
            Value::Str(name) => self.table.value_of(name),
            Value::Int(n) => i16::try_from(*n)
                .ok()
                .filter(|v| self.table.name_of(*v).is_some()),
            _ => None,
        };
        found.ok_or_else(|| WriteError::UnknownEnumElement {
            element: match item {
                Value::Enum(e) => e.name.to_string(),
                other => other.to_string(),
            },
            choices: self.ch_type(),
        })
    }
}

fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('\'');
    for c in name.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl Codec for EnumColumn {
    fn ch_type(&self) -> String {
        format!(
            "{}({})",
            self.enum_type.name(),
            self.table
                .iter()
                .map(|(name, value)| format!("{} = {}", quote(name), value))
                .join(", ")
        )
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Enum, ValueKind::Str, ValueKind::Int]
    }

    fn null_value(&self) -> Value {
        match self.table.name_of(0) {
            Some(name) => Value::Str(name.to_string()),
            None => Value::Int(0),
        }
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let values = items
            .iter()
            .map(|item| self.raw_value(item).map(i128::from))
            .collect::<Result<Vec<_>, _>>()?;
        match self.enum_type {
            EnumType::Enum8 => pack_ints::<i8>(&values, out)?,
            EnumType::Enum16 => pack_ints::<i16>(&values, out)?,
        }
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        let raw: Vec<i16> = match self.enum_type {
            EnumType::Enum8 => unpack_all::<i8, _>(n_items, buf)?
                .into_iter()
                .map(i16::from)
                .collect(),
            EnumType::Enum16 => unpack_all::<i16, _>(n_items, buf)?,
        };
        convert_rows(raw, nulls, |_, value| match self.table.name_of(value) {
            Some(name) => Ok(Value::Str(name.to_string())),
            None => Err(ReadError::UnknownEnumValue {
                value,
                ch_type: self.ch_type(),
            }),
        })
    }
}
