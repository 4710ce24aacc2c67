use super::error::{SerError, SerKind, SerResult};
use crate::merkle::Digest;

/// Cursor over an encoded payload.
///
/// Every read names the section and field it decodes so that a failure points
/// at the offending part of the layout. Reads never panic on short input.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Cursor at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Borrows the next `len` bytes.
    pub fn take(&mut self, len: usize, kind: SerKind, field: &'static str) -> SerResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| SerError::unexpected_end(kind, field))?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(
        &mut self,
        kind: SerKind,
        field: &'static str,
    ) -> SerResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, kind, field)?);
        Ok(out)
    }

    /// Single byte.
    pub fn read_u8(&mut self, kind: SerKind, field: &'static str) -> SerResult<u8> {
        self.take_array::<1>(kind, field).map(|[byte]| byte)
    }

    /// Little-endian `u16`.
    pub fn read_u16(&mut self, kind: SerKind, field: &'static str) -> SerResult<u16> {
        self.take_array(kind, field).map(u16::from_le_bytes)
    }

    /// Little-endian `u32`.
    pub fn read_u32(&mut self, kind: SerKind, field: &'static str) -> SerResult<u32> {
        self.take_array(kind, field).map(u32::from_le_bytes)
    }

    /// Any byte other than `0` or `1` is rejected.
    pub fn read_bool(&mut self, kind: SerKind, field: &'static str) -> SerResult<bool> {
        match self.read_u8(kind, field)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerError::invalid_value(kind, field)),
        }
    }

    /// `u32` byte length followed by the bytes.
    pub fn read_prefixed(&mut self, kind: SerKind, field: &'static str) -> SerResult<Vec<u8>> {
        let len = self.read_u32(kind, field)? as usize;
        self.take(len, kind, field).map(<[u8]>::to_vec)
    }

    /// Length-prefixed UTF-8 text.
    pub fn read_str(&mut self, kind: SerKind, field: &'static str) -> SerResult<String> {
        let bytes = self.read_prefixed(kind, field)?;
        String::from_utf8(bytes).map_err(|_| SerError::invalid_value(kind, field))
    }

    /// `width` digest bytes with no prefix.
    pub fn read_digest(
        &mut self,
        width: usize,
        kind: SerKind,
        field: &'static str,
    ) -> SerResult<Digest> {
        self.take(width, kind, field).map(|bytes| Digest::new(bytes.to_vec()))
    }

    /// Presence flag followed by the value when set.
    pub fn read_option<T, F>(
        &mut self,
        kind: SerKind,
        field: &'static str,
        read: F,
    ) -> SerResult<Option<T>>
    where
        F: FnOnce(&mut Self) -> SerResult<T>,
    {
        if self.read_bool(kind, field)? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a `u32` item count and then that many items.
    pub fn read_seq<T, F>(
        &mut self,
        kind: SerKind,
        field: &'static str,
        mut read: F,
    ) -> SerResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> SerResult<T>,
    {
        let count = self.read_u32(kind, field)? as usize;
        // Items take at least one byte each.
        if count > self.remaining() {
            return Err(SerError::invalid_length(kind, field));
        }
        (0..count).map(|_| read(self)).collect()
    }

    /// Fails unless the whole payload was consumed.
    pub fn finish(&self, kind: SerKind) -> SerResult<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(SerError::trailing_bytes(kind, self.offset, remaining)),
        }
    }
}
