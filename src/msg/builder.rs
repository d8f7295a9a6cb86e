use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{TlsError, TlsResult};
use crate::msg::codec::{check_u24, check_u8};
use crate::msg::transcript::TranscriptHash;
use crate::msg::HEADER_SIZE;
use crate::session::{AsyncHandshakeTransport, HandshakeTransport};

/// Body capacity reserved when the caller gives no size hint.
const DEFAULT_BODY_HINT: usize = 60;

/// Builder for a single outbound handshake message.
///
/// The buffer is seeded with the type byte and three placeholder
/// length bytes; body bytes are appended behind them and the real
/// length is patched in when the message is finished. Every send path
/// consumes the builder, so a sent (or failed) message cannot be
/// reused or transmitted twice.
///
/// The ClientHello-with-PSK-binders case is split out into
/// [`prepare_client_hello`](Self::prepare_client_hello) and
/// [`send_client_hello`](Self::send_client_hello) so that the common
/// single-phase path carries none of the binder bookkeeping.
pub struct HandshakeMessage {
    buf: Vec<u8>,
}

impl HandshakeMessage {
    /// Starts a message of the provided type with the default body
    /// capacity. Fails if the type does not fit in a single byte.
    pub fn new(msg_type: u16) -> TlsResult<Self> {
        Self::with_capacity(msg_type, DEFAULT_BODY_HINT)
    }

    /// Starts a message of the provided type, reserving capacity for
    /// a body of `body_hint` bytes. The hint only affects allocation;
    /// the body may grow past it.
    pub fn with_capacity(msg_type: u16, body_hint: usize) -> TlsResult<Self> {
        let msg_type = check_u8(msg_type)?;
        let mut buf = Vec::with_capacity(HEADER_SIZE + body_hint);
        buf.push(msg_type);
        // Reserve space for length, patched once the body is complete
        buf.extend_from_slice(&[0u8; 3]);
        Ok(Self { buf })
    }

    /// Appends a single body byte.
    pub fn push(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Appends body bytes, growing the buffer as needed. No length
    /// limit is enforced here; the 24-bit ceiling is checked when the
    /// message is finished.
    pub fn extend_body(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of body bytes written so far.
    pub fn body_len(&self) -> usize {
        self.buf.len() - HEADER_SIZE
    }

    /// Overwrites the three placeholder length bytes with the current
    /// body length plus `binders_size` bytes that are yet to arrive.
    fn patch_length(&mut self, binders_size: usize) -> TlsResult<()> {
        let length = check_u24(self.body_len() + binders_size)?;
        self.buf[1..HEADER_SIZE].copy_from_slice(&length.to_bytes());
        Ok(())
    }

    /// Patches the real length back in and gives up the finished wire
    /// bytes. Consuming `self` here is what releases the buffer on the
    /// error path as well as on success.
    fn finish(mut self) -> TlsResult<Vec<u8>> {
        self.patch_length(0)?;
        Ok(self.buf)
    }

    /// Finishes the message and hands it to the transport. Exactly one
    /// transport write occurs; the length check happens before it, so
    /// an oversized body never reaches the wire.
    pub fn send<T: HandshakeTransport>(self, transport: &mut T) -> TlsResult<()> {
        let buf = self.finish()?;
        debug!(
            msg_type = buf[0],
            body_len = buf.len() - HEADER_SIZE,
            "sending handshake message"
        );
        transport.write_handshake_message(&buf)
    }

    /// Suspendable form of [`send`](Self::send). Settles as cancelled
    /// if the token fires before the transport write is issued.
    pub async fn send_async<T: AsyncHandshakeTransport>(
        self,
        transport: &mut T,
        cancel: &CancelToken,
    ) -> TlsResult<()> {
        let buf = self.finish()?;
        cancel.checkpoint()?;
        debug!(
            msg_type = buf[0],
            body_len = buf.len() - HEADER_SIZE,
            "sending handshake message"
        );
        transport.write_handshake_message(&buf, cancel).await
    }

    /// First phase of the binder-pending ClientHello.
    ///
    /// The length field is patched to cover `binders_size` bytes that
    /// do not exist yet, and the transcript hash absorbs exactly the
    /// bytes present so far: type, patched length and the body without
    /// binders. No transport I/O happens here. The buffer stays
    /// appendable so the caller can write the binder bytes next.
    pub fn prepare_client_hello<H: TranscriptHash>(
        &mut self,
        transcript: &mut H,
        binders_size: usize,
    ) -> TlsResult<()> {
        self.patch_length(binders_size)?;
        transcript.update(&self.buf);
        Ok(())
    }

    /// Second phase: hashes the appended binder tail (skipped entirely
    /// when `binders_size` is zero) and returns the complete wire
    /// bytes. The hash thereby sees the whole ClientHello exactly
    /// once, partitioned as [everything-but-binders][binders].
    fn finish_client_hello<H: TranscriptHash>(
        self,
        transcript: &mut H,
        binders_size: usize,
    ) -> TlsResult<Vec<u8>> {
        let body = self.body_len();
        if binders_size > body {
            return Err(TlsError::BinderOverrun {
                binders: binders_size,
                body,
            });
        }
        if binders_size > 0 {
            transcript.update(&self.buf[self.buf.len() - binders_size..]);
        }
        Ok(self.buf)
    }

    /// Sends a prepared ClientHello whose binder bytes have been
    /// appended since [`prepare_client_hello`](Self::prepare_client_hello).
    pub fn send_client_hello<T, H>(
        self,
        transport: &mut T,
        transcript: &mut H,
        binders_size: usize,
    ) -> TlsResult<()>
    where
        T: HandshakeTransport,
        H: TranscriptHash,
    {
        let buf = self.finish_client_hello(transcript, binders_size)?;
        debug!(binders_size, total = buf.len(), "sending client hello");
        transport.write_handshake_message(&buf)
    }

    /// Suspendable form of [`send_client_hello`](Self::send_client_hello).
    pub async fn send_client_hello_async<T, H>(
        self,
        transport: &mut T,
        transcript: &mut H,
        binders_size: usize,
        cancel: &CancelToken,
    ) -> TlsResult<()>
    where
        T: AsyncHandshakeTransport,
        H: TranscriptHash + Send,
    {
        cancel.checkpoint()?;
        let buf = self.finish_client_hello(transcript, binders_size)?;
        debug!(binders_size, total = buf.len(), "sending client hello");
        transport.write_handshake_message(&buf, cancel).await
    }

    /// One-shot helper that frames and sends a complete body.
    pub fn send_body<T: HandshakeTransport>(
        transport: &mut T,
        msg_type: u16,
        body: &[u8],
    ) -> TlsResult<()> {
        let mut message = Self::with_capacity(msg_type, body.len())?;
        message.extend_body(body);
        message.send(transport)
    }

    /// Suspendable form of [`send_body`](Self::send_body).
    pub async fn send_body_async<T: AsyncHandshakeTransport>(
        transport: &mut T,
        msg_type: u16,
        body: &[u8],
        cancel: &CancelToken,
    ) -> TlsResult<()> {
        let mut message = Self::with_capacity(msg_type, body.len())?;
        message.extend_body(body);
        message.send_async(transport, cancel).await
    }
}
