//! Column codecs for the ClickHouse native protocol.
//!
//! A [`Column`] turns a slice of [`Value`]s into the bytes of one column of a
//! data block and back. Columns are usually built from the type name the
//! server sends with [`resolve`]:
//!
//! ```
//! use clickhouse_columns::{resolve, Context, SliceBuffer, Value};
//!
//! let column = resolve("Nullable(Int16)", &Context::default()).unwrap();
//! let mut bytes = Vec::new();
//! column
//!     .write_data(&[Value::Int(-2), Value::Null], &mut bytes)
//!     .unwrap();
//! assert_eq!(bytes, vec![0, 1, 0xfe, 0xff, 0, 0]);
//!
//! let values = column.read_data(2, &mut SliceBuffer::from(bytes)).unwrap();
//! assert_eq!(values, vec![Value::Int(-2), Value::Null]);
//! ```
//!
//! The transport is not part of this crate. Anything implementing
//! [`ReadBuffer`] / [`WriteBuffer`] can be used, [`IoBuffer`] adapts
//! `std::io` streams.

mod buffer;
mod column;
pub mod columns;
mod error;
mod escape;
mod nulls;
mod pack;
mod resolver;
mod settings;
mod value;

pub use buffer::{BufferError, IoBuffer, ReadBuffer, SliceBuffer, WriteBuffer};
pub use column::{Column, ColumnOptions};
pub use columns::ColumnKind;
pub use error::{Error, ReadError, WriteError};
pub use escape::{escape_param, escape_params, substitute_params, EscapeError};
pub use nulls::{read_nulls_map, write_nulls_map};
pub use pack::PackError;
pub use resolver::{parse_enum_members, resolve, ResolveError};
pub use settings::{ClientSettings, Context, ServerInfo};
pub use value::{EnumValue, Value, ValueKind};
