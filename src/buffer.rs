//! The byte-buffer contract column codecs read from and write to.
//!
//! Codecs never talk to a socket. The transport hands them something that
//! implements [`ReadBuffer`] or [`WriteBuffer`] and they consume/produce
//! exactly the bytes of one column.

use std::borrow::Cow;
use std::io::{Read, Write};

// Length prefixes larger than this are treated as corrupt rather than
// allocated.
pub(crate) const MAX_ALLOCATION: usize = 1_000_000_000;

// Row counts come from the caller, so storage for rows grows as they are read
// past this point.
const MAX_PREALLOCATED_ROWS: usize = 1 << 16;

#[derive(thiserror::Error, Debug)]
pub enum BufferError {
    #[error("short read: requested {requested} bytes but only {available} were available")]
    ShortRead { requested: usize, available: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("varint does not fit in 64 bits")]
    VarintTooLarge,
    #[error("attempted to allocate {attempted} which is larger than the maximum of {maximum}")]
    OverlargeAllocation { attempted: usize, maximum: usize },
}

/// Sequential reads of exact byte counts.
pub trait ReadBuffer {
    /// Read exactly `n` bytes. The returned slice is only valid until the
    /// next call.
    fn read(&mut self, n: usize) -> Result<&[u8], BufferError>;

    fn read_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.read(1)?[0])
    }

    /// Read an unsigned LEB128 varint.
    fn read_varint(&mut self) -> Result<u64, BufferError> {
        let mut result = 0_u64;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(BufferError::VarintTooLarge);
            }
            result |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 63 {
                return Err(BufferError::VarintTooLarge);
            }
        }
    }

    /// Read `n` varint-length-prefixed byte strings.
    fn read_strings(&mut self, n: usize) -> Result<Vec<Vec<u8>>, BufferError> {
        let mut out = Vec::with_capacity(n.min(MAX_PREALLOCATED_ROWS));
        for _ in 0..n {
            let len = usize::try_from(self.read_varint()?).unwrap_or(usize::MAX);
            if len > MAX_ALLOCATION {
                return Err(BufferError::OverlargeAllocation {
                    attempted: len,
                    maximum: MAX_ALLOCATION,
                });
            }
            out.push(self.read(len)?.to_vec());
        }
        Ok(out)
    }
}

/// Sequential, all-or-nothing writes.
pub trait WriteBuffer {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError>;

    fn write_varint(&mut self, value: u64) -> Result<(), BufferError> {
        let mut scratch = Vec::with_capacity(10);
        write_varint(&mut scratch, value);
        self.write(&scratch)
    }
}

/// Append an unsigned LEB128 varint to `out`, returning the number of bytes written.
pub(crate) fn write_varint(out: &mut Vec<u8>, value: u64) -> usize {
    leb128::write::unsigned(out, value).expect("writing to a Vec cannot fail")
}

impl WriteBuffer for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// A read cursor over bytes already in memory.
#[derive(Clone, Debug)]
pub struct SliceBuffer<'a> {
    offset: usize,
    data: Cow<'a, [u8]>,
}

impl<'a> SliceBuffer<'a> {
    pub fn new(data: Cow<'a, [u8]>) -> Self {
        SliceBuffer { offset: 0, data }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn done(&self) -> bool {
        self.offset >= self.data.len()
    }
}

impl<'a> From<&'a [u8]> for SliceBuffer<'a> {
    fn from(d: &'a [u8]) -> Self {
        Cow::Borrowed(d).into()
    }
}

impl<'a> From<Cow<'a, [u8]>> for SliceBuffer<'a> {
    fn from(d: Cow<'a, [u8]>) -> Self {
        SliceBuffer::new(d)
    }
}

impl From<Vec<u8>> for SliceBuffer<'static> {
    fn from(d: Vec<u8>) -> Self {
        SliceBuffer::new(Cow::Owned(d))
    }
}

impl<'a> ReadBuffer for SliceBuffer<'a> {
    fn read(&mut self, n: usize) -> Result<&[u8], BufferError> {
        if n > self.remaining() {
            return Err(BufferError::ShortRead {
                requested: n,
                available: self.remaining(),
            });
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.data[start..self.offset])
    }
}

/// Adapts a blocking `std::io` transport to the buffer traits.
#[derive(Debug)]
pub struct IoBuffer<T> {
    inner: T,
    scratch: Vec<u8>,
}

impl<T> IoBuffer<T> {
    pub fn new(inner: T) -> Self {
        IoBuffer {
            inner,
            scratch: Vec::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }
}

impl<T: Read> ReadBuffer for IoBuffer<T> {
    fn read(&mut self, n: usize) -> Result<&[u8], BufferError> {
        if n > MAX_ALLOCATION {
            return Err(BufferError::OverlargeAllocation {
                attempted: n,
                maximum: MAX_ALLOCATION,
            });
        }
        self.scratch.clear();
        self.scratch.resize(n, 0);
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut self.scratch[filled..]) {
                Ok(0) => {
                    return Err(BufferError::ShortRead {
                        requested: n,
                        available: filled,
                    })
                }
                Ok(read) => filled += read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(&self.scratch[..n])
    }
}

impl<T: Write> WriteBuffer for IoBuffer<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.inner.write_all(bytes)?;
        Ok(())
    }
}
