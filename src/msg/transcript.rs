/// Append-only, order-sensitive accumulator over the handshake bytes
/// as they appear on the wire. The message builder feeds it exactly
/// the bytes it transmits, in wire order, with no gaps or duplicates;
/// any divergence produces an invalid PSK binder on the peer. The
/// digest algorithm behind it belongs to the handshake layer.
pub trait TranscriptHash {
    /// Absorbs the next run of wire bytes into the running hash.
    fn update(&mut self, bytes: &[u8]);
}

/// Structure for keeping a record of all the handshake bytes that have
/// been sent and received. Used for computing Finished hashes. `finish`
/// is called to copy the current bytes over to `last`, which keeps a
/// separate snapshot for computing the hashes of the other side for
/// comparing.
#[derive(Debug, Default)]
pub struct MessageTranscript {
    current: Vec<u8>,
    last: Vec<u8>,
}

impl MessageTranscript {
    /// Creates a new empty message transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes accumulated so far.
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// The snapshot taken by the most recent `finish` call.
    pub fn last(&self) -> &[u8] {
        &self.last
    }

    /// Clears the `last` snapshot and copies the current bytes into it.
    pub fn finish(&mut self) {
        self.last.clear();
        self.last.extend_from_slice(&self.current);
    }
}

impl TranscriptHash for MessageTranscript {
    fn update(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }
}
