//! Handshake message framing and application data streaming for a
//! TLS protocol engine. Record-layer crypto, negotiation and key
//! derivation live elsewhere; this crate frames outbound handshake
//! messages (including the two-phase PSK-binder ClientHello), keeps
//! the transcript hash aligned with the wire, and wraps a completed
//! session as an ordinary byte stream in both blocking and
//! suspendable shapes.

pub mod bridge;
pub mod cancel;
pub mod error;
pub mod msg;
pub mod session;
pub mod stream;
