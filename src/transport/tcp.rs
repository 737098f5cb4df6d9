//! TCP connection to the backend node.

use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;

/// Connect to the backend's listening socket.
///
/// Requests are small and latency-sensitive, so Nagle's algorithm is
/// disabled on the socket.
pub async fn connect(addr: impl ToSocketAddrs) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
