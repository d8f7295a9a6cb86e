use crate::msg::codec::{u24, Codec, Reader};

pub mod builder;
pub mod codec;
pub mod transcript;

/// Size of the handshake message header: one type byte followed by
/// a three byte big-endian body length.
pub const HEADER_SIZE: usize = 1 + 3;

/// Parsed view of the four byte header that prefixes every handshake
/// message on the wire. The length excludes the header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub msg_type: u8,
    pub length: u24,
}

impl HandshakeHeader {
    /// Byte length of the body this header introduces.
    pub fn body_len(&self) -> usize {
        usize::from(self.length)
    }
}

impl Codec for HandshakeHeader {
    fn encode(&self, output: &mut Vec<u8>) {
        self.msg_type.encode(output);
        self.length.encode(output);
    }

    fn decode(input: &mut Reader) -> Option<Self> {
        let msg_type = input.take_byte()?;
        let length = u24::decode(input)?;
        Some(Self { msg_type, length })
    }
}
