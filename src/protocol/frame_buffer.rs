//! Accumulation buffer for partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management and a two-state machine for
//! fragmented frames:
//! - `WaitingForPrefix`: need at least 4 bytes
//! - `WaitingForPayload`: prefix parsed, need N more payload bytes

use bytes::{Bytes, BytesMut};

use super::frame::{decode_prefix, DEFAULT_MAX_FRAME_SIZE, PREFIX_SIZE};
use crate::error::{Result, WireError};

#[derive(Debug, Clone, Copy)]
enum State {
    WaitingForPrefix,
    WaitingForPayload { remaining: u32 },
}

/// Buffer that turns an arbitrary chunking of the inbound byte stream into
/// discrete frame payloads.
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
    max_frame_size: u32,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::with_max_frame(DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForPrefix,
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frame payloads.
    ///
    /// Partial data is kept internally for the next push. Each returned
    /// payload is one complete encoded term (version marker included).
    ///
    /// # Errors
    ///
    /// A prefix that claims more than the configured maximum frame size is a
    /// protocol violation; the stream cannot be resynchronized after it.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(data);

        let mut payloads = Vec::new();
        while let Some(payload) = self.try_extract_one()? {
            payloads.push(payload);
        }
        Ok(payloads)
    }

    fn try_extract_one(&mut self) -> Result<Option<Bytes>> {
        match self.state {
            State::WaitingForPrefix => {
                let Some(length) = decode_prefix(&self.buffer) else {
                    return Ok(None);
                };

                if length > self.max_frame_size {
                    return Err(WireError::Protocol(format!(
                        "frame of {} bytes exceeds maximum {}",
                        length, self.max_frame_size
                    )));
                }

                let _ = self.buffer.split_to(PREFIX_SIZE);
                self.state = State::WaitingForPayload { remaining: length };
                self.try_extract_one()
            }

            State::WaitingForPayload { remaining } => {
                let remaining = remaining as usize;
                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(remaining).freeze();
                self.state = State::WaitingForPrefix;
                Ok(Some(payload))
            }
        }
    }

    /// Number of buffered, not-yet-framed bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop buffered bytes and reset the state machine.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForPrefix;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
