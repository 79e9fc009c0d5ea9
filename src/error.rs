use thiserror::Error;

use crate::buffer::BufferError;
use crate::escape::EscapeError;
use crate::pack::PackError;
use crate::resolver::ResolveError;
use crate::value::ValueKind;

/// Failures while encoding one column. None of them are retried; the column
/// is abandoned and nothing is written to the buffer.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("value `{value}` of type {kind} is not accepted by a {ch_type} column")]
    TypeMismatch {
        value: String,
        kind: ValueKind,
        ch_type: String,
    },
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error("value `{value}` is {len} bytes which exceeds the column width of {width}")]
    ValueTooLarge {
        value: String,
        len: usize,
        width: usize,
    },
    #[error("Unknown element '{element}' for type {choices}")]
    UnknownEnumElement { element: String, choices: String },
    #[error("Cannot parse uuid '{0}'")]
    CannotParseUuid(String),
    #[error("Cannot parse {family} '{text}'")]
    CannotParseDomain { family: &'static str, text: String },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Failures while decoding one column.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("invalid utf8 in row {row}")]
    InvalidUtf8 { row: usize },
    #[error("value {value} is not a member of {ch_type}")]
    UnknownEnumValue { value: i16, ch_type: String },
    #[error("{ch_type} value {raw} is outside the supported calendar range")]
    OutOfRangeTemporal { raw: u32, ch_type: &'static str },
}

/// Any failure the crate can produce.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Escape(#[from] EscapeError),
}

impl WriteError {
    pub(crate) fn type_mismatch(value: &crate::Value, ch_type: &str) -> Self {
        WriteError::TypeMismatch {
            value: value.to_string(),
            kind: value.kind(),
            ch_type: ch_type.to_string(),
        }
    }
}
