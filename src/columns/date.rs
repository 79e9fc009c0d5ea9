use chrono::{Days, NaiveDate};

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_ints, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec};

/// 1970-01-01
pub(crate) fn unix_epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Calendar dates stored as a UInt16 count of days since 1970-01-01.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateColumn;

impl DateColumn {
    pub fn new() -> Self {
        DateColumn
    }
}

impl Codec for DateColumn {
    fn ch_type(&self) -> String {
        "Date".to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Date]
    }

    fn null_value(&self) -> Value {
        Value::Date(unix_epoch())
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let days = items
            .iter()
            .map(|item| match item {
                Value::Null => Ok(0),
                Value::Date(d) => {
                    Ok(i128::from(d.signed_duration_since(unix_epoch()).num_days()))
                }
                other => Err(PackError::not_packable(other, "UInt16").into()),
            })
            .collect::<Result<Vec<_>, WriteError>>()?;
        pack_ints::<u16>(&days, out)?;
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        convert_rows(unpack_all::<u16, _>(n_items, buf)?, nulls, |_, days| {
            unix_epoch()
                .checked_add_days(Days::new(u64::from(days)))
                .map(Value::Date)
                .ok_or(ReadError::OutOfRangeTemporal {
                    raw: u32::from(days),
                    ch_type: "Date",
                })
        })
    }
}
