use std::fmt::Debug;

use crate::error::{TlsError, TlsResult};

/// Structure that allows reading through a slice of bytes
/// using a cursor state for positioning.
pub struct Reader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the provided buffer. The
    /// initial cursor position begins at zero.
    pub fn new(buf: &[u8]) -> Reader {
        Reader { buf, cursor: 0 }
    }

    /// Takes a slice of the underlying slice from the cursor
    /// position to the end of the slice. Moves the cursor to
    /// the end of the slice.
    pub fn remaining(&mut self) -> &[u8] {
        let ret = &self.buf[self.cursor..];
        self.cursor = self.buf.len();
        ret
    }

    /// Attempts to take a single byte from the underlying
    /// slice and move the cursor. Returns None if there are
    /// no bytes past the cursor.
    pub fn take_byte(&mut self) -> Option<u8> {
        if self.available() < 1 {
            return None;
        }
        let value = self.buf[self.cursor];
        self.cursor += 1;
        Some(value)
    }

    /// Attempt to take the provided `length` of bytes. If there
    /// are not enough bytes in the buffer after the current cursor
    /// position None will be returned instead.
    pub fn take(&mut self, length: usize) -> Option<&[u8]> {
        if self.available() < length {
            return None;
        }
        let current = self.cursor;
        self.cursor += length;
        Some(&self.buf[current..current + length])
    }

    /// Return the number of bytes that can still be
    /// visited using the cursor.
    pub fn available(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Return the cursor position (the position in the buffer
    /// that the next read will take place from).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Attempts to create a new reader over a slice of the
    /// provided length. Will return None if the required
    /// length was not available.
    pub fn slice(&mut self, length: usize) -> Option<Reader> {
        self.take(length).map(Reader::new)
    }
}

/// Trait implemented by types that can be written to and parsed
/// back from their wire representation.
pub trait Codec: Debug + Sized {
    /// Encodes the implementation, appending it to the
    /// output byte vec.
    fn encode(&self, output: &mut Vec<u8>);

    /// Decodes the implementation from the reader. If the
    /// decoding fails then None is returned.
    fn decode(input: &mut Reader) -> Option<Self>;

    /// Shortcut for encoding the implementation directly into
    /// a newly created Vec rather than an existing one.
    fn encode_vec(&self) -> Vec<u8> {
        let mut output = Vec::new();
        self.encode(&mut output);
        output
    }

    /// Attempt to decode the implementation from the provided
    /// slice of bytes. Creates a reader and calls `decode`.
    fn decode_bytes(buf: &[u8]) -> Option<Self> {
        let mut reader = Reader::new(buf);
        Self::decode(&mut reader)
    }
}

impl Codec for u8 {
    fn encode(&self, output: &mut Vec<u8>) {
        output.push(*self);
    }

    fn decode(input: &mut Reader) -> Option<Self> {
        input.take_byte()
    }
}

impl Codec for u16 {
    fn encode(&self, output: &mut Vec<u8>) {
        let out_slice: [u8; 2] = (*self).to_be_bytes();
        output.extend_from_slice(&out_slice);
    }

    fn decode(input: &mut Reader) -> Option<Self> {
        let be_bytes: [u8; 2] = input.take(2)?.try_into().ok()?;
        Some(u16::from_be_bytes(be_bytes))
    }
}

/// Handshake framing uses 24-bit length fields so this struct is a
/// wrapper around a u32 which encodes and decodes only three bytes.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct u24(pub u32);

impl u24 {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let [a, b, c]: [u8; 3] = bytes.try_into().ok()?;
        Some(Self(u32::from_be_bytes([0, a, b, c])))
    }

    /// The three wire bytes of this value, big-endian.
    pub fn to_bytes(self) -> [u8; 3] {
        let be_bytes = u32::to_be_bytes(self.0);
        [be_bytes[1], be_bytes[2], be_bytes[3]]
    }
}

impl Codec for u24 {
    fn encode(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.to_bytes())
    }

    fn decode(input: &mut Reader) -> Option<Self> {
        input.take(3).and_then(u24::from_bytes)
    }
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl From<u24> for usize {
    #[inline]
    fn from(value: u24) -> Self {
        value.0 as Self
    }
}

/// Guards a handshake message type against the single byte it
/// occupies on the wire. Values above 255 are a wire-compatibility
/// defect and are rejected rather than truncated.
pub fn check_u8(value: u16) -> TlsResult<u8> {
    u8::try_from(value).map_err(|_| TlsError::IllegalHandshakeType(value))
}

/// Guards a handshake body length against the three bytes it
/// occupies on the wire.
pub fn check_u24(value: usize) -> TlsResult<u24> {
    if value > 0xFF_FFFF {
        return Err(TlsError::BodyTooLong(value));
    }
    Ok(u24(value as u32))
}
