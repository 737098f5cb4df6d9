//! Codec module - the binary term format encoder and decoder.
//!
//! [`encode`] and [`decode`] are pure functions over [`Term`](crate::term::Term):
//! stateless, no I/O. Every encoded buffer starts with the version marker
//! byte and contains exactly one term; framing is the transport's concern
//! (see [`protocol`](crate::protocol)).

mod etf;

pub use etf::{decode, decode_with_depth, encode, encode_with_depth, tag, DEFAULT_MAX_DEPTH, VERSION};
