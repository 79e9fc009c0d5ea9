//! Maps a wire type name such as `Nullable(Decimal(18, 4))` to a [`Column`].

use std::iter::Peekable;
use std::str::Chars;

use chrono_tz::Tz;
use smol_str::SmolStr;

use crate::column::{Column, ColumnOptions};
use crate::columns::{
    ColumnKind, DateColumn, DateTimeColumn, DecimalColumn, EnumColumn, EnumTable, EnumType,
    FixedStringColumn, FloatColumn, FloatType, IntColumn, IntType, Ipv4Column, Ipv6Column,
    StringColumn, UuidColumn,
};
use crate::settings::Context;

const MAX_DECIMAL_PRECISION: u32 = 38;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown type {0}")]
    UnknownType(String),
    #[error("invalid decimal precision {precision} and scale {scale}")]
    InvalidDecimal { precision: u32, scale: u32 },
    #[error("invalid length in {0}")]
    InvalidFixedStringLength(String),
    #[error("malformed enum {spec}: {reason}")]
    MalformedEnum { spec: String, reason: &'static str },
    #[error("duplicate enum member {0}")]
    DuplicateEnumMember(String),
    #[error("value {value} of enum member {name} does not fit {enum_type}")]
    EnumValueOutOfRange {
        name: String,
        value: i16,
        enum_type: &'static str,
    },
    #[error("unknown timezone {0}")]
    UnknownTimezone(String),
}

/// Build the column for `type_name` under the session `context`.
pub fn resolve(type_name: &str, context: &Context) -> Result<Column, ResolveError> {
    let type_name = type_name.trim();
    let (inner, nullable) = match parameters(type_name, "Nullable") {
        Some(inner) => (inner.trim(), true),
        None => (type_name, false),
    };
    let kind = resolve_kind(inner, context)?;
    let options = ColumnOptions::default()
        .with_nullable(nullable)
        .with_types_check(context.settings.types_check);
    let column = Column::new(kind, options);
    tracing::debug!(
        type_name,
        ch_type = %column.ch_type(),
        types_check = options.types_check,
        "resolved column"
    );
    Ok(column)
}

fn resolve_kind(type_name: &str, context: &Context) -> Result<ColumnKind, ResolveError> {
    let as_bytes = context.settings.strings_as_bytes;
    if let Some(int_type) = IntType::from_name(type_name) {
        return Ok(IntColumn::new(int_type).into());
    }
    let kind: ColumnKind = match type_name {
        "Float32" => FloatColumn::new(FloatType::Float32).into(),
        "Float64" => FloatColumn::new(FloatType::Float64).into(),
        "Date" => DateColumn::new().into(),
        "DateTime" => DateTimeColumn::new(default_timezone(context)?).into(),
        "String" => StringColumn::new(as_bytes).into(),
        "UUID" => UuidColumn::new().into(),
        "IPv4" => Ipv4Column::new().into(),
        "IPv6" => Ipv6Column::new().into(),
        _ => return resolve_parameterized(type_name, context),
    };
    Ok(kind)
}

fn resolve_parameterized(type_name: &str, context: &Context) -> Result<ColumnKind, ResolveError> {
    if let Some(tz) = parameters(type_name, "DateTime") {
        let tz = unquote(tz.trim()).unwrap_or(tz.trim());
        return Ok(DateTimeColumn::new(Some(parse_timezone(tz)?)).into());
    }
    if let Some(params) = parameters(type_name, "Decimal") {
        let (precision, scale) = params
            .split_once(',')
            .and_then(|(p, s)| {
                let precision = p.trim().parse::<u32>().ok()?;
                let scale = s.trim().parse::<u32>().ok()?;
                Some((precision, scale))
            })
            .ok_or_else(|| ResolveError::UnknownType(type_name.to_string()))?;
        return decimal(precision, scale);
    }
    for (prefix, precision) in [("Decimal32", 9), ("Decimal64", 18), ("Decimal128", 38)] {
        if let Some(scale) = parameters(type_name, prefix) {
            let scale = scale
                .trim()
                .parse::<u32>()
                .map_err(|_| ResolveError::UnknownType(type_name.to_string()))?;
            return decimal(precision, scale);
        }
    }
    if let Some(length) = parameters(type_name, "FixedString") {
        let length = length
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|l| *l > 0)
            .ok_or_else(|| ResolveError::InvalidFixedStringLength(type_name.to_string()))?;
        return Ok(FixedStringColumn::new(length, context.settings.strings_as_bytes).into());
    }
    for enum_type in [EnumType::Enum8, EnumType::Enum16] {
        if let Some(members) = parameters(type_name, enum_type.name()) {
            let table = EnumTable::new(parse_enum_members(members)?)?;
            return Ok(EnumColumn::new(enum_type, table)?.into());
        }
    }
    Err(ResolveError::UnknownType(type_name.to_string()))
}

fn decimal(precision: u32, scale: u32) -> Result<ColumnKind, ResolveError> {
    if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
        return Err(ResolveError::InvalidDecimal { precision, scale });
    }
    Ok(DecimalColumn::new(precision, scale).into())
}

/// An explicit zone wins; otherwise the client zone when asked for, else the
/// server's advertised zone.
fn default_timezone(context: &Context) -> Result<Option<Tz>, ResolveError> {
    if context.settings.use_client_time_zone {
        return Ok(None);
    }
    context
        .server_info
        .timezone
        .as_deref()
        .map(parse_timezone)
        .transpose()
}

fn parse_timezone(name: &str) -> Result<Tz, ResolveError> {
    name.parse::<Tz>()
        .map_err(|_| ResolveError::UnknownTimezone(name.to_string()))
}

/// The text between the parentheses of `prefix(...)`.
fn parameters<'a>(type_name: &'a str, prefix: &str) -> Option<&'a str> {
    type_name
        .strip_prefix(prefix)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn unquote(text: &str) -> Option<&str> {
    text.strip_prefix('\'')?.strip_suffix('\'')
}

/// Parse `'a' = 1, 'b' = 2`. Names may contain backslash escaped quotes.
pub fn parse_enum_members(spec: &str) -> Result<Vec<(SmolStr, i16)>, ResolveError> {
    let malformed = |reason: &'static str| ResolveError::MalformedEnum {
        spec: spec.to_string(),
        reason,
    };
    let mut chars = spec.chars().peekable();
    let mut members = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        if chars.next() != Some('\'') {
            return Err(malformed("expected a quoted name"));
        }
        let name = quoted_name(&mut chars).ok_or_else(|| malformed("unterminated name"))?;
        skip_whitespace(&mut chars);
        if chars.next() != Some('=') {
            return Err(malformed("expected '='"));
        }
        skip_whitespace(&mut chars);
        let mut digits = String::new();
        while let Some(c) = chars.next_if(|c| *c == '-' || c.is_ascii_digit()) {
            digits.push(c);
        }
        let value = digits
            .parse::<i16>()
            .map_err(|_| malformed("expected a 16 bit value"))?;
        members.push((SmolStr::from(name), value));
        skip_whitespace(&mut chars);
        match chars.next() {
            None => return Ok(members),
            Some(',') => continue,
            Some(_) => return Err(malformed("expected ','")),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

/// Read up to the closing quote; the opening one is already consumed.
fn quoted_name(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut name = String::new();
    loop {
        match chars.next()? {
            '\'' => return Some(name),
            '\\' => name.push(chars.next()?),
            c => name.push(c),
        }
    }
}
