use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::error::TlsResult;

/// Blocking transport seam consumed by the message builder. One call
/// carries exactly one fully framed handshake message and is ordered
/// with respect to other writes on the same session.
pub trait HandshakeTransport {
    fn write_handshake_message(&mut self, message: &[u8]) -> TlsResult<()>;
}

/// Suspendable form of [`HandshakeTransport`]. Implementations should
/// honour the cancellation token before the write is issued; once the
/// record is on the wire there is nothing left to cancel.
#[async_trait]
pub trait AsyncHandshakeTransport: Send {
    async fn write_handshake_message(
        &mut self,
        message: &[u8],
        cancel: &CancelToken,
    ) -> TlsResult<()>;
}

/// Read and write surface of a handshake-completed protocol session,
/// wrapped by [`TlsStream`](crate::stream::TlsStream). Record
/// fragmentation, decryption and sequence numbers all live behind this
/// seam.
///
/// Each direction is sequential: a new read must not start before a
/// prior read on the same session completes, and likewise for writes.
#[async_trait]
pub trait TlsSession: Send {
    /// Reads decrypted application data, waiting until at least one
    /// byte is available. Returns `Ok(0)` on orderly end of data.
    async fn read_application_data(
        &mut self,
        buf: &mut [u8],
        cancel: &CancelToken,
    ) -> TlsResult<usize>;

    /// Writes application data, producing one or more record-layer
    /// writes as needed.
    async fn write_application_data(&mut self, buf: &[u8], cancel: &CancelToken) -> TlsResult<()>;

    /// Forces any buffered outbound data down to the transport.
    async fn flush(&mut self, cancel: &CancelToken) -> TlsResult<()>;

    /// Tears the session down. Called at most once by the adapter.
    async fn close(&mut self) -> TlsResult<()>;
}
