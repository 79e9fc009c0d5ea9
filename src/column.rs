use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::columns::{ColumnKind, ItemCheck};
use crate::error::{ReadError, WriteError};
use crate::nulls::{read_nulls_map, write_nulls_map};
use crate::pack::PackError;
use crate::value::{Value, ValueKind};

/// How a column treats its items beyond the encoding of its kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    /// A one byte per row null map precedes the payload.
    pub nullable: bool,
    /// Reject items whose kind the column does not accept and normalize
    /// values that do not fit the storage width.
    pub types_check: bool,
}

impl ColumnOptions {
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_types_check(mut self, types_check: bool) -> Self {
        self.types_check = types_check;
        self
    }
}

/// A codec for one column of a data block.
///
/// Writing is all-or-nothing: every item is validated and packed into a
/// scratch buffer before a single write to the destination, so a failed
/// write leaves the destination untouched.
#[derive(Clone)]
pub struct Column {
    kind: ColumnKind,
    options: ColumnOptions,
    check_item: Option<ItemCheck>,
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("check_item", &self.check_item.is_some())
            .finish()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.options == other.options
    }
}

impl Column {
    pub fn new<K: Into<ColumnKind>>(kind: K, options: ColumnOptions) -> Self {
        let kind = kind.into();
        let check_item = if options.types_check {
            kind.item_check()
        } else {
            None
        };
        Column {
            kind,
            options,
            check_item,
        }
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn options(&self) -> ColumnOptions {
        self.options
    }

    pub fn nullable(&self) -> bool {
        self.options.nullable
    }

    pub fn types_check(&self) -> bool {
        self.options.types_check
    }

    /// The server-side type name, wrapped in `Nullable(..)` when nullable.
    pub fn ch_type(&self) -> String {
        let inner = self.kind.ch_type();
        if self.options.nullable {
            format!("Nullable({})", inner)
        } else {
            inner
        }
    }

    pub fn accepts(&self) -> &'static [ValueKind] {
        self.kind.accepts()
    }

    pub fn null_value(&self) -> Value {
        self.kind.null_value()
    }

    /// Encode `items` and append the column bytes to `buf` in one write.
    pub fn write_data<W: WriteBuffer + ?Sized>(
        &self,
        items: &[Value],
        buf: &mut W,
    ) -> Result<(), WriteError> {
        tracing::trace!(ch_type = %self.ch_type(), n_items = items.len(), "writing column");
        self.prepare_items(items)?;

        let mut out = Vec::new();
        if self.options.nullable {
            write_nulls_map(items, &mut out);
        }
        self.kind
            .write_items(items, self.options.types_check, &mut out)?;
        buf.write(&out)?;
        Ok(())
    }

    /// Decode exactly `n_items` values of this column from `buf`.
    pub fn read_data<R: ReadBuffer + ?Sized>(
        &self,
        n_items: usize,
        buf: &mut R,
    ) -> Result<Vec<Value>, ReadError> {
        tracing::trace!(ch_type = %self.ch_type(), n_items, "reading column");
        let nulls_map = if self.options.nullable {
            Some(read_nulls_map(n_items, buf)?)
        } else {
            None
        };
        let mut items = self.kind.read_items(n_items, nulls_map.as_deref(), buf)?;
        if let Some(nulls_map) = nulls_map {
            for (item, is_null) in items.iter_mut().zip(nulls_map) {
                if is_null {
                    *item = Value::Null;
                }
            }
        }
        Ok(items)
    }

    /// The type check, then the item check, then the null policy, each over
    /// every item before the next starts. Nulls skip both checks.
    fn prepare_items(&self, items: &[Value]) -> Result<(), WriteError> {
        if self.options.types_check {
            let accepts = self.kind.accepts();
            if let Some(bad) = items
                .iter()
                .filter(|item| !item.is_null())
                .find(|item| !accepts.contains(&item.kind()))
            {
                return Err(WriteError::type_mismatch(bad, &self.ch_type()));
            }
        }

        if let Some(check) = self.check_item {
            for item in items.iter().filter(|item| !item.is_null()) {
                check(&self.kind, item)?;
            }
        }

        if !self.options.nullable {
            if let Some(row) = items.iter().position(Value::is_null) {
                return Err(PackError::UnexpectedNull(row).into());
            }
        }
        Ok(())
    }
}
