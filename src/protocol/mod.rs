//! Framing layer: explicit length-prefixed message boundaries.
//!
//! Every message on the stream is a 4-byte big-endian length prefix followed
//! by one encoded term. The prefix is the only framing signal; scanning for
//! the codec's version-marker byte would be unsound, since payload bytes may
//! legitimately hold that value.

mod frame;
mod frame_buffer;

pub use frame::{build_frame, decode_prefix, encode_prefix, DEFAULT_MAX_FRAME_SIZE, PREFIX_SIZE};
pub use frame_buffer::FrameBuffer;
