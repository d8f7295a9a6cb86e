use std::io::{self, Read, Seek, SeekFrom, Write};

use tracing::debug;

use crate::bridge;
use crate::cancel::CancelToken;
use crate::error::{TlsError, TlsResult};
use crate::session::TlsSession;

/// Byte-oriented, full-duplex view over one handshake-completed
/// protocol session.
///
/// Every operation exists in two shapes: a suspendable `async fn` and
/// a `*_blocking` counterpart. The blocking shape is
/// [`bridge::wait`] applied to the async body, so both observe
/// identical effects and the delegation logic exists once. The
/// `std::io` trait impls ride on the blocking shape.
///
/// The channel has no addressable position: seeking and length
/// queries fail deterministically without touching the session.
pub struct TlsStream<S: TlsSession> {
    session: S,
    closed: bool,
}

impl<S: TlsSession> TlsStream<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.session
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.session
    }

    fn ensure_open(&self) -> TlsResult<()> {
        if self.closed {
            return Err(TlsError::StreamClosed);
        }
        Ok(())
    }

    /// Reads decrypted application data into `buf`, suspending until
    /// at least one byte is available. Returns `Ok(0)` on orderly end
    /// of data, never a partial failure.
    pub async fn read(&mut self, buf: &mut [u8], cancel: &CancelToken) -> TlsResult<usize> {
        self.ensure_open()?;
        cancel.checkpoint()?;
        self.session.read_application_data(buf, cancel).await
    }

    /// Reads a single byte. `None` marks orderly end of data,
    /// distinguishing it from every valid byte value.
    pub async fn read_byte(&mut self, cancel: &CancelToken) -> TlsResult<Option<u8>> {
        let mut buf = [0u8; 1];
        let count = self.read(&mut buf, cancel).await?;
        Ok(if count == 0 { None } else { Some(buf[0]) })
    }

    /// Writes application data. Record fragmentation happens behind
    /// the session seam, so one call here may produce several
    /// record-layer writes.
    pub async fn write(&mut self, buf: &[u8], cancel: &CancelToken) -> TlsResult<()> {
        self.ensure_open()?;
        cancel.checkpoint()?;
        self.session.write_application_data(buf, cancel).await
    }

    pub async fn write_byte(&mut self, value: u8, cancel: &CancelToken) -> TlsResult<()> {
        self.write(&[value], cancel).await
    }

    /// Forces buffered outbound data to the transport. When this
    /// returns, everything previously written has been handed down.
    pub async fn flush(&mut self, cancel: &CancelToken) -> TlsResult<()> {
        self.ensure_open()?;
        cancel.checkpoint()?;
        self.session.flush(cancel).await
    }

    /// Drains the readable side into `dest` until end of data,
    /// returning the number of bytes copied. Expressed purely as
    /// repeated read/write calls; no buffering state survives it.
    pub async fn copy_to<W: Write>(&mut self, dest: &mut W, cancel: &CancelToken) -> TlsResult<u64> {
        let mut buf = [0u8; 4096];
        let mut total = 0u64;
        loop {
            let count = self.read(&mut buf, cancel).await?;
            if count == 0 {
                return Ok(total);
            }
            dest.write_all(&buf[..count])?;
            total += count as u64;
        }
    }

    /// Closes the underlying session. The session sees at most one
    /// close; reads and writes after this fail with
    /// [`TlsError::StreamClosed`]. A stream dropped without closing
    /// simply drops the session, whose own teardown releases the
    /// transport.
    pub async fn close(&mut self) -> TlsResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!("closing tls stream");
        self.session.close().await
    }

    pub fn read_blocking(&mut self, buf: &mut [u8]) -> TlsResult<usize> {
        bridge::wait(self.read(buf, &CancelToken::new()))
    }

    pub fn read_byte_blocking(&mut self) -> TlsResult<Option<u8>> {
        bridge::wait(self.read_byte(&CancelToken::new()))
    }

    pub fn write_blocking(&mut self, buf: &[u8]) -> TlsResult<()> {
        bridge::wait(self.write(buf, &CancelToken::new()))
    }

    pub fn write_byte_blocking(&mut self, value: u8) -> TlsResult<()> {
        bridge::wait(self.write_byte(value, &CancelToken::new()))
    }

    pub fn flush_blocking(&mut self) -> TlsResult<()> {
        bridge::wait(self.flush(&CancelToken::new()))
    }

    pub fn copy_to_blocking<W: Write>(&mut self, dest: &mut W) -> TlsResult<u64> {
        bridge::wait(self.copy_to(dest, &CancelToken::new()))
    }

    pub fn close_blocking(&mut self) -> TlsResult<()> {
        bridge::wait(self.close())
    }

    /// A live network byte stream has no length.
    pub fn length(&self) -> TlsResult<u64> {
        Err(TlsError::NotSeekable)
    }

    pub fn set_length(&mut self, _length: u64) -> TlsResult<()> {
        Err(TlsError::NotSeekable)
    }

    /// A live network byte stream has no position.
    pub fn position(&self) -> TlsResult<u64> {
        Err(TlsError::NotSeekable)
    }
}

impl<S: TlsSession> Read for TlsStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_blocking(buf).map_err(io::Error::from)
    }
}

impl<S: TlsSession> Write for TlsStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_blocking(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_blocking().map_err(io::Error::from)
    }
}

impl<S: TlsSession> Seek for TlsStream<S> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(TlsError::NotSeekable.into())
    }
}

#[cfg(test)]
mod test {
    use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::TlsStream;
    use crate::cancel::CancelToken;
    use crate::error::{TlsError, TlsResult};
    use crate::session::TlsSession;

    /// In-memory session: serves canned inbound bytes, records
    /// outbound writes and flush points, counts closes.
    #[derive(Default)]
    struct MemorySession {
        incoming: Vec<u8>,
        read_pos: usize,
        written: Vec<u8>,
        /// Length of `written` observed at each flush call.
        flush_marks: Vec<usize>,
        close_count: Arc<AtomicUsize>,
    }

    impl MemorySession {
        fn with_incoming(incoming: &[u8]) -> Self {
            Self {
                incoming: incoming.to_vec(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl TlsSession for MemorySession {
        async fn read_application_data(
            &mut self,
            buf: &mut [u8],
            cancel: &CancelToken,
        ) -> TlsResult<usize> {
            cancel.checkpoint()?;
            let available = &self.incoming[self.read_pos..];
            let count = available.len().min(buf.len());
            buf[..count].copy_from_slice(&available[..count]);
            self.read_pos += count;
            Ok(count)
        }

        async fn write_application_data(
            &mut self,
            buf: &[u8],
            cancel: &CancelToken,
        ) -> TlsResult<()> {
            cancel.checkpoint()?;
            self.written.extend_from_slice(buf);
            Ok(())
        }

        async fn flush(&mut self, cancel: &CancelToken) -> TlsResult<()> {
            cancel.checkpoint()?;
            self.flush_marks.push(self.written.len());
            Ok(())
        }

        async fn close(&mut self) -> TlsResult<()> {
            self.close_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn read_drains_session_then_reports_eof() {
        let cancel = CancelToken::new();
        let mut stream = TlsStream::new(MemorySession::with_incoming(&[1, 2, 3, 4, 5]));

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf, &cancel).await.unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);

        assert_eq!(stream.read_byte(&cancel).await.unwrap(), Some(4));
        assert_eq!(stream.read_byte(&cancel).await.unwrap(), Some(5));
        // Orderly end of data is None, not an error
        assert_eq!(stream.read_byte(&cancel).await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_then_flush_hands_bytes_down_first() {
        let cancel = CancelToken::new();
        let mut stream = TlsStream::new(MemorySession::default());

        stream.write(b"hello", &cancel).await.unwrap();
        stream.write_byte(b'!', &cancel).await.unwrap();
        stream.flush(&cancel).await.unwrap();

        let session = stream.get_ref();
        assert_eq!(session.written, b"hello!");
        assert_eq!(session.flush_marks, vec![6]);
    }

    #[tokio::test]
    async fn copy_to_is_repeated_reads_and_writes() {
        let cancel = CancelToken::new();
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let mut stream = TlsStream::new(MemorySession::with_incoming(&payload));

        let mut sink = Vec::new();
        let copied = stream.copy_to(&mut sink, &cancel).await.unwrap();
        assert_eq!(copied, payload.len() as u64);
        assert_eq!(sink, payload);
    }

    #[tokio::test]
    async fn close_reaches_session_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let session = MemorySession {
            close_count: closes.clone(),
            ..MemorySession::default()
        };
        let mut stream = TlsStream::new(session);

        stream.close().await.unwrap();
        stream.close().await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let cancel = CancelToken::new();
        let mut buf = [0u8; 1];
        assert!(matches!(
            stream.read(&mut buf, &cancel).await,
            Err(TlsError::StreamClosed)
        ));
        assert!(matches!(
            stream.write(&[1], &cancel).await,
            Err(TlsError::StreamClosed)
        ));
    }

    #[test]
    fn seek_and_length_fail_deterministically() {
        let mut stream = TlsStream::new(MemorySession::default());

        assert!(matches!(stream.length(), Err(TlsError::NotSeekable)));
        assert!(matches!(stream.set_length(10), Err(TlsError::NotSeekable)));
        assert!(matches!(stream.position(), Err(TlsError::NotSeekable)));

        let err = stream.seek(SeekFrom::Start(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn blocking_shape_matches_suspendable_shape() {
        let mut stream = TlsStream::new(MemorySession::with_incoming(b"abc"));

        let mut buf = [0u8; 8];
        let count = Read::read(&mut stream, &mut buf).unwrap();
        assert_eq!(&buf[..count], b"abc");

        assert_eq!(Write::write(&mut stream, b"xy").unwrap(), 2);
        Write::flush(&mut stream).unwrap();

        let session = stream.get_ref();
        assert_eq!(session.written, b"xy");
        assert_eq!(session.flush_marks, vec![2]);
    }

    #[tokio::test]
    async fn cancelled_read_settles_without_touching_session() {
        let cancel = CancelToken::new();
        cancel.cancel("caller deadline");

        let mut stream = TlsStream::new(MemorySession::with_incoming(b"data"));
        let mut buf = [0u8; 4];
        let err = stream.read(&mut buf, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(stream.get_ref().read_pos, 0);
    }
}
