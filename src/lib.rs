//! # termwire
//!
//! Rust client for exchanging function-call requests with an external
//! compute node over a stream connection, using a compact self-describing
//! binary term format.
//!
//! ## Architecture
//!
//! - **Term codec**: pure encode/decode between [`Term`] trees and the
//!   version-marked binary format.
//! - **Framing**: every message travels as a 4-byte big-endian length prefix
//!   followed by one encoded term.
//! - **Correlation**: each [`Request`] carries a fresh Ref; the [`Client`]
//!   pairs responses with callers by Ref alone, so replies may arrive in any
//!   order.
//!
//! ## Example
//!
//! ```ignore
//! use termwire::{CallTimeout, Client, Request, Term};
//!
//! #[tokio::main]
//! async fn main() -> termwire::Result<()> {
//!     let client = Client::connect("127.0.0.1:9000").await?;
//!     let request = Request::new("algorithm", "compile", vec![Term::str("flood.erl")]);
//!     let response = client.call(&request, CallTimeout::default()).await?;
//!     println!("{}", response.payload());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod ops;
pub mod protocol;
pub mod term;
pub mod transport;

mod request;
mod service;
mod writer;

pub use error::{DecodeError, EncodeError, Result, WireError};
pub use request::{Request, Response};
pub use service::{CallTimeout, Client, ClientConfig, MAX_REQUEST_SIZE};
pub use term::Term;
