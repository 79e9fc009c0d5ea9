use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_ints, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec};

/// Timestamps stored as UInt32 seconds since the unix epoch.
///
/// Naive timestamps are interpreted in the column's timezone, or in the
/// process-local zone when none is configured, and decoded back into the
/// same zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeColumn {
    timezone: Option<Tz>,
}

impl DateTimeColumn {
    pub fn new(timezone: Option<Tz>) -> Self {
        DateTimeColumn { timezone }
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    fn timestamp(&self, item: &Value) -> Result<i128, WriteError> {
        Ok(match item {
            Value::Null => 0,
            Value::Int(n) => *n,
            Value::DateTimeTz(dt) => i128::from(dt.timestamp()),
            Value::DateTime(naive) => i128::from(match &self.timezone {
                Some(tz) => localize(tz, naive),
                None => localize(&chrono::Local, naive),
            }),
            other => return Err(PackError::not_packable(other, "UInt32").into()),
        })
    }

    fn to_naive(&self, timestamp: u32) -> Option<NaiveDateTime> {
        let utc = DateTime::from_timestamp(i64::from(timestamp), 0)?;
        Some(match &self.timezone {
            Some(tz) => utc.with_timezone(tz).naive_local(),
            None => utc.with_timezone(&chrono::Local).naive_local(),
        })
    }
}

/// Seconds since the epoch for a wall-clock time in `zone`. An ambiguous time
/// resolves to the later instant (standard time). A time skipped by a DST
/// transition is shifted by the offset in force the day before.
fn localize<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> i64 {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) => dt.timestamp(),
        LocalResult::Ambiguous(_, later) => later.timestamp(),
        LocalResult::None => {
            let before = *naive - TimeDelta::days(1);
            let offset = zone.offset_from_utc_datetime(&before).fix();
            tracing::warn!(%naive, %offset, "local time does not exist in timezone");
            naive.and_utc().timestamp() - i64::from(offset.local_minus_utc())
        }
    }
}

impl Codec for DateTimeColumn {
    fn ch_type(&self) -> String {
        match &self.timezone {
            Some(tz) => format!("DateTime('{}')", tz.name()),
            None => "DateTime".to_string(),
        }
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::DateTime, ValueKind::DateTimeTz, ValueKind::Int]
    }

    fn null_value(&self) -> Value {
        Value::DateTime(NaiveDateTime::default())
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let timestamps = items
            .iter()
            .map(|item| self.timestamp(item))
            .collect::<Result<Vec<_>, _>>()?;
        pack_ints::<u32>(&timestamps, out)?;
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        convert_rows(unpack_all::<u32, _>(n_items, buf)?, nulls, |_, raw| {
            self.to_naive(raw)
                .map(Value::DateTime)
                .ok_or(ReadError::OutOfRangeTemporal {
                    raw,
                    ch_type: "DateTime",
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SliceBuffer;
    use chrono::{FixedOffset, NaiveDate};

    fn naive(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn encode(col: &DateTimeColumn, items: &[Value]) -> Vec<u32> {
        let mut out = Vec::new();
        col.write_items(items, true, &mut out).unwrap();
        let mut buf = SliceBuffer::from(out);
        unpack_all::<u32, _>(items.len(), &mut buf).unwrap()
    }

    #[test]
    fn naive_times_use_the_column_timezone() {
        let col = DateTimeColumn::new(Some(chrono_tz::Europe::Moscow));
        // Moscow is UTC+3 all year round since 2014
        let stamps = encode(&col, &[Value::DateTime(naive(2020, 1, 1, 3, 0, 0))]);
        assert_eq!(stamps, vec![1_577_836_800]);
    }

    #[test]
    fn aware_times_use_their_own_offset() {
        let col = DateTimeColumn::new(Some(chrono_tz::Europe::Moscow));
        let aware = FixedOffset::east_opt(3600)
            .unwrap()
            .from_local_datetime(&naive(2020, 1, 1, 1, 0, 0))
            .unwrap();
        let stamps = encode(&col, &[Value::DateTimeTz(aware)]);
        assert_eq!(stamps, vec![1_577_836_800]);
    }

    #[test]
    fn raw_ints_bypass_conversion() {
        let col = DateTimeColumn::new(Some(chrono_tz::Asia::Tokyo));
        assert_eq!(encode(&col, &[Value::Int(1_500_000_000)]), vec![1_500_000_000]);
    }

    #[test]
    fn ambiguous_times_pick_standard_time() {
        let col = DateTimeColumn::new(Some(chrono_tz::Europe::Berlin));
        // 02:30 happens twice on 2021-10-31; CET (+1) is the later one
        let stamps = encode(&col, &[Value::DateTime(naive(2021, 10, 31, 2, 30, 0))]);
        assert_eq!(stamps, vec![1_635_643_800]);
    }

    #[test]
    fn skipped_times_still_encode() {
        let col = DateTimeColumn::new(Some(chrono_tz::Europe::Berlin));
        // 02:30 does not exist on 2021-03-28; shifted by CET
        let stamps = encode(&col, &[Value::DateTime(naive(2021, 3, 28, 2, 30, 0))]);
        assert_eq!(stamps, vec![1_616_895_000]);
    }

    #[test]
    fn decodes_into_the_column_timezone() {
        let col = DateTimeColumn::new(Some(chrono_tz::UTC));
        let data = 1_577_836_800_u32.to_le_bytes();
        let mut buf = SliceBuffer::from(&data[..]);
        let values = col.read_items(1, None, &mut buf).unwrap();
        assert_eq!(values, vec![Value::DateTime(naive(2020, 1, 1, 0, 0, 0))]);
    }

    #[test]
    fn without_a_timezone_naive_times_are_process_local() {
        let col = DateTimeColumn::new(None);
        let noon = naive(2020, 1, 15, 12, 0, 0);
        let expected = chrono::Local
            .from_local_datetime(&noon)
            .single()
            .unwrap()
            .timestamp();

        let mut out = Vec::new();
        col.write_items(&[Value::DateTime(noon)], true, &mut out)
            .unwrap();
        assert_eq!(out, (expected as u32).to_le_bytes().to_vec());

        let mut buf = SliceBuffer::from(out);
        let values = col.read_items(1, None, &mut buf).unwrap();
        assert_eq!(values, vec![Value::DateTime(noon)]);
    }

    #[test]
    fn negative_timestamps_do_not_fit() {
        let col = DateTimeColumn::new(Some(chrono_tz::UTC));
        let mut out = Vec::new();
        assert!(col.write_items(&[Value::Int(-1)], true, &mut out).is_err());
    }

    #[test]
    fn type_name_carries_the_timezone() {
        assert_eq!(
            DateTimeColumn::new(Some(chrono_tz::Europe::Moscow)).ch_type(),
            "DateTime('Europe/Moscow')"
        );
        assert_eq!(DateTimeColumn::new(None).ch_type(), "DateTime");
    }
}
