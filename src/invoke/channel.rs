// src/invoke/channel.rs

use tracing::warn;

/// Byte accumulator for one output channel of the child.
///
/// Bytes are appended in the order the OS delivered them. Once the channel
/// is closed (end of stream seen, or the invocation was torn down) nothing
/// more is appended.
#[derive(Debug)]
pub struct ChannelBuffer {
    name: &'static str,
    bytes: Vec<u8>,
    open: bool,
}

impl ChannelBuffer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            bytes: Vec::new(),
            open: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Append a chunk. Returns `false` (and keeps the buffer unchanged) if the
    /// channel is already closed.
    pub fn append(&mut self, chunk: &[u8]) -> bool {
        if !self.open {
            warn!(
                channel = self.name,
                bytes = chunk.len(),
                "dropping append on closed channel"
            );
            return false;
        }
        self.bytes.extend_from_slice(chunk);
        true
    }

    /// Mark the channel closed. Returns `true` only for the call that
    /// actually closed it.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
