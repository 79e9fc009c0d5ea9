//! Rendering values as SQL literals for client-side parameter substitution.

use std::collections::BTreeMap;

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::value::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    #[error("missing parameter {0}")]
    MissingParameter(String),
    #[error("malformed placeholder at byte {0}")]
    MalformedPlaceholder(usize),
}

fn escape_char(c: char) -> Option<&'static str> {
    Some(match c {
        '\u{8}' => "\\b",
        '\u{c}' => "\\f",
        '\r' => "\\r",
        '\n' => "\\n",
        '\t' => "\\t",
        '\0' => "\\0",
        '\u{7}' => "\\a",
        '\u{b}' => "\\v",
        '\\' => "\\\\",
        '\'' => "\\'",
        _ => return None,
    })
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match escape_char(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// The SQL literal for `value`.
pub fn escape_param(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        Value::DateTimeTz(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        Value::Str(s) => quote(s),
        Value::Array(items) => format!("[{}]", items.iter().map(escape_param).join(", ")),
        Value::Tuple(items) => format!("({})", items.iter().map(escape_param).join(", ")),
        Value::Enum(e) => e.value.to_string(),
        Value::Uuid(_) | Value::Ipv4(_) | Value::Ipv6(_) => format!("'{}'", value),
        Value::Int(_) | Value::Float(_) | Value::Decimal(_) | Value::Bytes(_) => value.to_string(),
    }
}

/// Escape every value of a named parameter set.
pub fn escape_params<'a, I, K>(params: I) -> BTreeMap<K, String>
where
    I: IntoIterator<Item = (K, &'a Value)>,
    K: Ord,
{
    params
        .into_iter()
        .map(|(key, value)| (key, escape_param(value)))
        .collect()
}

/// Replace `%(name)s` placeholders in `query` with the escaped parameters.
/// `%%` is a literal percent sign.
pub fn substitute_params<'a, I, K>(query: &str, params: I) -> Result<String, EscapeError>
where
    I: IntoIterator<Item = (K, &'a Value)>,
    K: AsRef<str>,
{
    let escaped: FxHashMap<String, String> = params
        .into_iter()
        .map(|(key, value)| (key.as_ref().to_string(), escape_param(value)))
        .collect();

    let mut out = String::with_capacity(query.len());
    let mut rest = query;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let position = query.len() - rest.len() + start;
        let after = &rest[start + 1..];
        if let Some(tail) = after.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }
        let (name, tail) = after
            .strip_prefix('(')
            .and_then(|a| a.split_once(")s"))
            .ok_or(EscapeError::MalformedPlaceholder(position))?;
        let literal = escaped
            .get(name)
            .ok_or_else(|| EscapeError::MissingParameter(name.to_string()))?;
        out.push_str(literal);
        rest = tail;
    }
    out.push_str(rest);
    Ok(out)
}
