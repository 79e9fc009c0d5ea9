use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_all, pack_ints, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec, ColumnKind, ItemCheck};

// i128::MAX has 39 decimal digits.
const MAX_SCALED_DIGITS: i128 = 39;

/// The signed integer width a decimal's scaled value is stored in, chosen by
/// precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalStorage {
    Int32,
    Int64,
    Int128,
}

impl DecimalStorage {
    pub fn for_precision(precision: u32) -> Self {
        match precision {
            0..=9 => DecimalStorage::Int32,
            10..=18 => DecimalStorage::Int64,
            _ => DecimalStorage::Int128,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DecimalStorage::Int32 => "Int32",
            DecimalStorage::Int64 => "Int64",
            DecimalStorage::Int128 => "Int128",
        }
    }

    fn max(self) -> i128 {
        match self {
            DecimalStorage::Int32 => i128::from(i32::MAX),
            DecimalStorage::Int64 => i128::from(i64::MAX),
            DecimalStorage::Int128 => i128::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalColumn {
    precision: u32,
    scale: u32,
    storage: DecimalStorage,
}

impl DecimalColumn {
    pub fn new(precision: u32, scale: u32) -> Self {
        DecimalColumn {
            precision,
            scale,
            storage: DecimalStorage::for_precision(precision),
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn storage(&self) -> DecimalStorage {
        self.storage
    }

    /// `value * 10^scale`, rounded half to even.
    fn scaled(&self, value: &Value) -> Result<i128, WriteError> {
        let decimal = match value {
            Value::Null => return Ok(0),
            Value::Decimal(d) => d.clone(),
            Value::Int(n) => BigDecimal::new(BigInt::from(*n), 0),
            Value::Float(x) => BigDecimal::from_f64(*x)
                .ok_or_else(|| PackError::not_packable(x, self.storage.name()))?,
            other => return Err(PackError::not_packable(other, self.storage.name()).into()),
        };
        if decimal.is_zero() {
            return Ok(0);
        }
        // integer digits of the scaled value, known before rescaling
        let int_digits = i128::from(decimal.digits()) - i128::from(decimal.fractional_digit_count())
            + i128::from(self.scale);
        if int_digits > MAX_SCALED_DIGITS {
            let magnitude = format!("with {} integer digits", int_digits);
            return Err(PackError::out_of_range(magnitude, self.storage.name()).into());
        }
        if int_digits < 0 {
            // below a tenth of the last digit, rounds to zero
            return Ok(0);
        }
        let (digits, _) = decimal
            .with_scale_round(i64::from(self.scale), RoundingMode::HalfEven)
            .into_bigint_and_exponent();
        digits
            .to_i128()
            .ok_or_else(|| PackError::out_of_range(&decimal, self.storage.name()).into())
    }
}

fn check_range(kind: &ColumnKind, value: &Value) -> Result<(), WriteError> {
    let ColumnKind::Decimal(col) = kind else {
        return Ok(());
    };
    let max = col.storage.max();
    match col.scaled(value) {
        Ok(scaled) if (-max..=max).contains(&scaled) => Ok(()),
        _ => Err(WriteError::type_mismatch(value, &col.ch_type())),
    }
}

/// Split a 128 bit value into its (low, high) 64 bit words, two's
/// complement for negatives.
pub fn split_int128(value: i128) -> (u64, u64) {
    if value >= 0 {
        let value = value as u128;
        (value as u64, (value >> 64) as u64)
    } else {
        let magnitude = value.unsigned_abs();
        let (low, high) = (magnitude as u64, (magnitude >> 64) as u64);
        // negate the magnitude word by word, carrying out of the low word
        let (low, carry) = (!low).overflowing_add(1);
        let high = if carry { (!high).wrapping_add(1) } else { !high };
        (low, high)
    }
}

/// Inverse of [`split_int128`]: a high word above `i64::MAX` marks a negative.
pub fn join_int128(low: u64, high: u64) -> i128 {
    if high > i64::MAX as u64 {
        -(i128::from(u64::MAX - high) << 64) - i128::from(u64::MAX - low) - 1
    } else {
        (i128::from(high) << 64) + i128::from(low)
    }
}

impl Codec for DecimalColumn {
    fn ch_type(&self) -> String {
        format!("Decimal({}, {})", self.precision, self.scale)
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Decimal, ValueKind::Float, ValueKind::Int]
    }

    fn null_value(&self) -> Value {
        Value::Decimal(BigDecimal::new(BigInt::from(0), i64::from(self.scale)))
    }

    fn item_check(&self) -> Option<ItemCheck> {
        Some(check_range)
    }

    fn write_items(
        &self,
        items: &[Value],
        _strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let items = items
            .iter()
            .map(|item| self.scaled(item))
            .collect::<Result<Vec<_>, _>>()?;
        match self.storage {
            DecimalStorage::Int32 => pack_ints::<i32>(&items, out)?,
            DecimalStorage::Int64 => pack_ints::<i64>(&items, out)?,
            DecimalStorage::Int128 => {
                let words = items
                    .iter()
                    .flat_map(|item| {
                        let (low, high) = split_int128(*item);
                        [low, high]
                    })
                    .collect::<Vec<_>>();
                pack_all(&words, out);
            }
        }
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        let raw: Vec<i128> = match self.storage {
            DecimalStorage::Int32 => unpack_all::<i32, _>(n_items, buf)?
                .into_iter()
                .map(i128::from)
                .collect(),
            DecimalStorage::Int64 => unpack_all::<i64, _>(n_items, buf)?
                .into_iter()
                .map(i128::from)
                .collect(),
            DecimalStorage::Int128 => {
                let n_words = n_items.saturating_mul(2);
                unpack_all::<u64, _>(n_words, buf)?
                    .chunks_exact(2)
                    .map(|pair| join_int128(pair[0], pair[1]))
                    .collect()
            }
        };
        let scale = i64::from(self.scale);
        convert_rows(raw, nulls, |_, digits| {
            Ok(Value::Decimal(BigDecimal::new(BigInt::from(digits), scale)))
        })
    }
}
