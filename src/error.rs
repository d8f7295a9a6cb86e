use std::io;

use thiserror::Error;

use crate::cancel::CancelReason;

/// Errors surfaced by the framing and stream layer.
///
/// Encoding-limit violations are raised before any transport write is
/// attempted, so a failed build never leaves a half-written message on
/// the wire. Transport failures pass through the underlying `io::Error`
/// untouched.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Handshake message types occupy a single byte on the wire.
    #[error("handshake type {0} does not fit in a single byte")]
    IllegalHandshakeType(u16),

    /// Handshake body lengths occupy three bytes on the wire.
    #[error("handshake body of {0} bytes exceeds the 24-bit length field")]
    BodyTooLong(usize),

    /// A ClientHello send claimed more binder bytes than the buffer holds.
    #[error("binder area of {binders} bytes exceeds the {body} byte body")]
    BinderOverrun { binders: usize, body: usize },

    #[error(transparent)]
    Io(#[from] io::Error),

    /// The application-data channel has no addressable position.
    #[error("stream is not seekable and has no length")]
    NotSeekable,

    /// The stream was closed and further reads or writes were attempted.
    #[error("stream is closed")]
    StreamClosed,

    /// The operation settled as cancelled before completing.
    #[error("operation cancelled: {0}")]
    Cancelled(CancelReason),

    /// The outcome of a bridged operation was already taken by an
    /// earlier wait on the same token.
    #[error("operation outcome already taken")]
    OutcomeTaken,
}

impl TlsError {
    /// Whether this error reports cancellation rather than a fault.
    /// Callers racing a cancellation signal against an operation use
    /// this to tell an abandoned operation from a genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TlsError::Cancelled(_))
    }
}

/// Mapping used by the `std::io` trait impls on the stream adapter.
impl From<TlsError> for io::Error {
    fn from(err: TlsError) -> Self {
        match err {
            TlsError::Io(inner) => inner,
            TlsError::NotSeekable => io::Error::new(io::ErrorKind::Unsupported, err),
            TlsError::StreamClosed => io::Error::new(io::ErrorKind::NotConnected, err),
            TlsError::Cancelled(_) => io::Error::new(io::ErrorKind::Interrupted, err),
            TlsError::IllegalHandshakeType(_)
            | TlsError::BodyTooLong(_)
            | TlsError::BinderOverrun { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            TlsError::OutcomeTaken => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

pub type TlsResult<T> = Result<T, TlsError>;

#[cfg(test)]
mod test {
    use std::io::{self, ErrorKind};

    use super::TlsError;
    use crate::cancel::CancelReason;

    #[test]
    fn io_mapping_keeps_error_categories() {
        let cases = [
            (TlsError::IllegalHandshakeType(256), ErrorKind::InvalidInput),
            (TlsError::BodyTooLong(1 << 24), ErrorKind::InvalidInput),
            (
                TlsError::BinderOverrun {
                    binders: 3,
                    body: 2,
                },
                ErrorKind::InvalidInput,
            ),
            (TlsError::NotSeekable, ErrorKind::Unsupported),
            (TlsError::StreamClosed, ErrorKind::NotConnected),
            (
                TlsError::Cancelled(CancelReason::new("deadline")),
                ErrorKind::Interrupted,
            ),
            (TlsError::OutcomeTaken, ErrorKind::Other),
        ];
        for (err, kind) in cases {
            assert_eq!(io::Error::from(err).kind(), kind);
        }
    }

    #[test]
    fn transport_errors_pass_through_unchanged() {
        let inner = io::Error::new(ErrorKind::BrokenPipe, "peer gone");
        let mapped = io::Error::from(TlsError::Io(inner));
        assert_eq!(mapped.kind(), ErrorKind::BrokenPipe);
        assert_eq!(mapped.to_string(), "peer gone");
    }
}
