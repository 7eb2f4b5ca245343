// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked read cursor and growable write buffer for the tagged format.

use super::varint::{decode_varint, encode_varint, varint_len, VarintError};
use crate::error::{SerResult, SerializationError};

/// Generate fixed-width little-endian read methods.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> SerResult<$type> {
            let bytes = self.read_bytes($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// Read cursor over an encoded payload.
///
/// Offsets reported in errors are absolute within the outermost payload,
/// including for readers created by [`Reader::sub_reader`].
pub struct Reader<'a> {
    buffer: &'a [u8],
    offset: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            base: 0,
        }
    }

    /// Absolute position of the next byte.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_u64_le, u64, 8);

    pub fn read_f64_le(&mut self) -> SerResult<f64> {
        Ok(f64::from_bits(self.read_u64_le()?))
    }

    pub fn read_varint(&mut self) -> SerResult<u64> {
        let tail = self.buffer.get(self.offset..).unwrap_or_default();
        match decode_varint(tail) {
            Ok((value, used)) => {
                self.offset += used;
                Ok(value)
            }
            Err(VarintError::UnexpectedEof) => {
                Err(SerializationError::malformed(self.offset(), "truncated varint"))
            }
            Err(VarintError::Overflow) => {
                Err(SerializationError::malformed(self.offset(), "varint overflows u64"))
            }
        }
    }

    /// Read a varint length prefix and check it against the remaining input
    /// and `limit` before anything is allocated.
    pub fn read_length(&mut self, limit: usize, what: &str) -> SerResult<usize> {
        let at = self.offset();
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| SerializationError::malformed(at, format!("{} length overflows", what)))?;
        if len > limit {
            return Err(SerializationError::malformed(
                at,
                format!("{} length {} exceeds limit {}", what, len, limit),
            ));
        }
        Ok(len)
    }

    pub fn read_bytes(&mut self, len: usize) -> SerResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(SerializationError::malformed(
                self.offset(),
                format!("need {} bytes, {} remaining", len, self.remaining()),
            ));
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> SerResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Carve the next `len` bytes off into their own reader.
    pub fn sub_reader(&mut self, len: usize) -> SerResult<Reader<'a>> {
        let base = self.offset();
        let buffer = self.read_bytes(len)?;
        Ok(Reader {
            buffer,
            offset: 0,
            base,
        })
    }
}

/// Append-only output buffer.
#[derive(Default)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_varint(&mut self, value: u64) {
        encode_varint(value, &mut self.buffer);
    }

    pub fn write_f64_le(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Write `varint(len) data`.
    pub fn write_len_prefixed(&mut self, data: &[u8]) {
        let len = data.len() as u64;
        self.buffer.reserve(varint_len(len) + data.len());
        self.write_varint(len);
        self.write_bytes(data);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}
