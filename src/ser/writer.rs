use super::error::{SerError, SerKind, SerResult};
use crate::merkle::Digest;

/// Converts a length or arena index into its `u32` wire form.
pub fn ensure_u32(value: usize, kind: SerKind, field: &'static str) -> SerResult<u32> {
    u32::try_from(value).map_err(|_| SerError::invalid_length(kind, field))
}

/// Append-only buffer producing the little-endian binary layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrows the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Little-endian `u16`.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Single byte, `0` or `1`.
    pub fn put_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    /// Writes a `usize` as `u32`, failing when it does not fit.
    pub fn put_index(
        &mut self,
        value: usize,
        kind: SerKind,
        field: &'static str,
    ) -> SerResult<()> {
        let value = ensure_u32(value, kind, field)?;
        self.put_u32(value);
        Ok(())
    }

    /// `u32` byte length followed by the bytes themselves.
    pub fn put_prefixed(
        &mut self,
        bytes: &[u8],
        kind: SerKind,
        field: &'static str,
    ) -> SerResult<()> {
        self.put_index(bytes.len(), kind, field)?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Length-prefixed UTF-8 text.
    pub fn put_str(&mut self, value: &str, kind: SerKind, field: &'static str) -> SerResult<()> {
        self.put_prefixed(value.as_bytes(), kind, field)
    }

    /// Digest bytes with no length prefix. The reader learns `width` from the
    /// algorithm named in the header, so a digest of any other width is
    /// refused here.
    pub fn put_digest(
        &mut self,
        digest: &Digest,
        width: usize,
        kind: SerKind,
        field: &'static str,
    ) -> SerResult<()> {
        if digest.len() != width {
            return Err(SerError::invalid_length(kind, field));
        }
        self.buf.extend_from_slice(digest.as_bytes());
        Ok(())
    }

    /// Presence flag followed by the value when there is one.
    pub fn put_option<T, F>(&mut self, value: Option<&T>, put: F) -> SerResult<()>
    where
        F: FnOnce(&mut Self, &T) -> SerResult<()>,
    {
        match value {
            Some(inner) => {
                self.put_bool(true);
                put(self, inner)
            }
            None => {
                self.put_bool(false);
                Ok(())
            }
        }
    }

    /// `u32` item count followed by every item.
    pub fn put_seq<T, F>(
        &mut self,
        items: &[T],
        kind: SerKind,
        field: &'static str,
        mut put: F,
    ) -> SerResult<()>
    where
        F: FnMut(&mut Self, &T) -> SerResult<()>,
    {
        self.put_index(items.len(), kind, field)?;
        items.iter().try_for_each(|item| put(self, item))
    }
}

impl From<ByteWriter> for Vec<u8> {
    fn from(writer: ByteWriter) -> Self {
        writer.into_bytes()
    }
}
