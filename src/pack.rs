//! Fixed-width little-endian packing of numeric primitives, many values at a time.

use std::fmt::Display;

use crate::buffer::{BufferError, ReadBuffer};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PackError {
    #[error("value {value} does not fit in {primitive}")]
    OutOfRange {
        value: String,
        primitive: &'static str,
    },
    #[error("value {value} cannot be packed as {primitive}")]
    NotPackable {
        value: String,
        primitive: &'static str,
    },
    #[error("unexpected null at row {0} of a non-nullable column")]
    UnexpectedNull(usize),
}

impl PackError {
    pub(crate) fn out_of_range<V: Display>(value: V, primitive: &'static str) -> Self {
        PackError::OutOfRange {
            value: value.to_string(),
            primitive,
        }
    }

    pub(crate) fn not_packable<V: Display>(value: V, primitive: &'static str) -> Self {
        PackError::NotPackable {
            value: value.to_string(),
            primitive,
        }
    }
}

pub trait Packable: Copy + Sized {
    const WIDTH: usize;
    const NAME: &'static str;

    fn pack(item: Self, out: &mut Vec<u8>);

    /// `bytes` is always exactly `WIDTH` long.
    fn unpack(bytes: &[u8]) -> Self;
}

macro_rules! impl_packable {
    ($ty: ty, $name: literal) => {
        impl Packable for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            const NAME: &'static str = $name;

            fn pack(item: Self, out: &mut Vec<u8>) {
                out.extend_from_slice(&item.to_le_bytes());
            }

            fn unpack(bytes: &[u8]) -> Self {
                let mut raw = [0_u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }
        }
    };
}

impl_packable!(i8, "Int8");
impl_packable!(i16, "Int16");
impl_packable!(i32, "Int32");
impl_packable!(i64, "Int64");
impl_packable!(u8, "UInt8");
impl_packable!(u16, "UInt16");
impl_packable!(u32, "UInt32");
impl_packable!(u64, "UInt64");
impl_packable!(f32, "Float32");
impl_packable!(f64, "Float64");

pub fn pack_all<T: Packable>(items: &[T], out: &mut Vec<u8>) {
    out.reserve(items.len() * T::WIDTH);
    for item in items {
        T::pack(*item, out);
    }
}

/// Pack wide integers as `T`, failing on the first value `T` cannot hold.
pub fn pack_ints<T>(items: &[i128], out: &mut Vec<u8>) -> Result<(), PackError>
where
    T: Packable + TryFrom<i128>,
{
    out.reserve(items.len() * T::WIDTH);
    for item in items {
        let narrowed = T::try_from(*item).map_err(|_| PackError::out_of_range(item, T::NAME))?;
        T::pack(narrowed, out);
    }
    Ok(())
}

/// Pack doubles as single precision. Finite values beyond the f32 range are
/// rejected; infinities and NaN pass through.
pub fn pack_f32(items: &[f64], out: &mut Vec<u8>) -> Result<(), PackError> {
    out.reserve(items.len() * f32::WIDTH);
    for item in items {
        if item.is_finite() && item.abs() > f64::from(f32::MAX) {
            return Err(PackError::out_of_range(item, f32::NAME));
        }
        f32::pack(*item as f32, out);
    }
    Ok(())
}

pub fn unpack_all<T, R>(n_items: usize, buf: &mut R) -> Result<Vec<T>, BufferError>
where
    T: Packable,
    R: ReadBuffer + ?Sized,
{
    let size = n_items
        .checked_mul(T::WIDTH)
        .ok_or(BufferError::OverlargeAllocation {
            attempted: usize::MAX,
            maximum: usize::MAX / T::WIDTH,
        })?;
    let bytes = buf.read(size)?;
    Ok(bytes.chunks_exact(T::WIDTH).map(T::unpack).collect())
}
