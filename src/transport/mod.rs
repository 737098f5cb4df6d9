//! Stream transport to the backend node.

mod tcp;

pub use tcp::connect;
