use crate::buffer::ReadBuffer;
use crate::error::{ReadError, WriteError};
use crate::pack::{pack_all, pack_f32, unpack_all, PackError};
use crate::value::{Value, ValueKind};

use super::{convert_rows, Codec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatType {
    Float32,
    Float64,
}

impl FloatType {
    pub fn name(self) -> &'static str {
        match self {
            FloatType::Float32 => "Float32",
            FloatType::Float64 => "Float64",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatColumn {
    float_type: FloatType,
}

impl FloatColumn {
    pub fn new(float_type: FloatType) -> Self {
        FloatColumn { float_type }
    }

    pub fn float_type(&self) -> FloatType {
        self.float_type
    }

    fn normalize(&self, items: &[Value], strict: bool) -> Result<Vec<f64>, WriteError> {
        let reduce = strict && self.float_type == FloatType::Float32;
        items
            .iter()
            .map(|item| {
                let x = match item {
                    Value::Null => 0.0,
                    Value::Float(x) => *x,
                    Value::Int(n) => *n as f64,
                    other => {
                        return Err(PackError::not_packable(other, self.float_type.name()).into())
                    }
                };
                // strict mode quietly rounds to single precision, overflow becomes infinity
                Ok(if reduce { f64::from(x as f32) } else { x })
            })
            .collect()
    }
}

impl Codec for FloatColumn {
    fn ch_type(&self) -> String {
        self.float_type.name().to_string()
    }

    fn accepts(&self) -> &'static [ValueKind] {
        &[ValueKind::Float, ValueKind::Int]
    }

    fn null_value(&self) -> Value {
        Value::Float(0.0)
    }

    fn write_items(
        &self,
        items: &[Value],
        strict: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), WriteError> {
        let items = self.normalize(items, strict)?;
        match self.float_type {
            FloatType::Float32 => pack_f32(&items, out)?,
            FloatType::Float64 => pack_all(&items, out),
        }
        Ok(())
    }

    fn read_items<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        nulls: Option<&[bool]>,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        match self.float_type {
            FloatType::Float32 => convert_rows(unpack_all::<f32, _>(n_items, buf)?, nulls, |_, x| {
                Ok(Value::Float(f64::from(x)))
            }),
            FloatType::Float64 => convert_rows(unpack_all::<f64, _>(n_items, buf)?, nulls, |_, x| {
                Ok(Value::Float(x))
            }),
        }
    }
}
