//! Connection-owning service: `call`/`cast`/`cancel` with Ref correlation.
//!
//! A [`Client`] owns one stream connection. Outgoing requests are encoded,
//! length-prefixed, and handed to a dedicated writer task; a reader task
//! de-frames the inbound byte stream and resolves each decoded response
//! against the pending-call table by its Ref. Responses may arrive in any
//! order relative to the order calls were issued.
//!
//! The pending-call table is the only shared mutable state. Whichever of
//! response / timeout / cancellation / connection-failure removes an entry
//! first wins; every later event for the same Ref is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::codec;
use crate::error::{Result, WireError};
use crate::protocol::{FrameBuffer, DEFAULT_MAX_FRAME_SIZE};
use crate::request::{Request, Response};
use crate::writer::{spawn_writer_task, WriterHandle, DEFAULT_CHANNEL_CAPACITY};

/// Maximum encoded size of a single outgoing request (1 MiB), enforced at
/// call time before anything is written.
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Per-call timeout. `Infinity` is meant for long-poll reads that resolve
/// only once the backend has something to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTimeout {
    After(Duration),
    Infinity,
}

impl Default for CallTimeout {
    fn default() -> Self {
        CallTimeout::After(Duration::from_secs(5))
    }
}

impl From<Duration> for CallTimeout {
    fn from(duration: Duration) -> Self {
        CallTimeout::After(duration)
    }
}

/// Tuning knobs for a connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum accepted inbound frame payload.
    pub max_frame_size: u32,
    /// Read buffer size for the reader task.
    pub read_buffer_size: usize,
    /// Outbound frame queue capacity.
    pub channel_capacity: usize,
    /// Nesting bound applied when decoding inbound terms.
    pub max_decode_depth: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_buffer_size: 64 * 1024,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_decode_depth: codec::DEFAULT_MAX_DEPTH,
        }
    }
}

type ReplySender = oneshot::Sender<Result<Response>>;
type PendingTable = Arc<Mutex<HashMap<String, ReplySender>>>;

fn lock_pending(pending: &PendingTable) -> std::sync::MutexGuard<'_, HashMap<String, ReplySender>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A connected client: one stream, one pending-call table.
pub struct Client {
    writer: WriterHandle,
    pending: PendingTable,
    read_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl Client {
    /// Connect to a backend node over TCP.
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = crate::transport::connect(addr).await?;
        Ok(Self::from_stream(stream))
    }

    /// Drive an already-established duplex stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::from_stream_with_config(stream, ClientConfig::default())
    }

    pub fn from_stream_with_config<S>(stream: S, config: ClientConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (writer, writer_task) = spawn_writer_task(write_half, config.channel_capacity);

        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let table = pending.clone();
        let read_task = tokio::spawn(async move {
            match read_loop(read_half, &table, &config).await {
                Ok(()) => tracing::debug!("connection closed by peer"),
                Err(error) => tracing::error!("read loop failed: {error}"),
            }
            fail_all_pending(&table);
        });

        Self {
            writer,
            pending,
            read_task,
            writer_task,
        }
    }

    /// Issue a call and wait for its correlated response.
    ///
    /// Fails without writing when the encoded request reaches
    /// [`MAX_REQUEST_SIZE`]; fails immediately on write failure. A finite
    /// timeout fails the call with [`WireError::Timeout`] once it elapses
    /// with no response; a response that arrives first always wins.
    pub async fn call(&self, request: &Request, timeout: CallTimeout) -> Result<Response> {
        let encoded = codec::encode(&request.to_term())?;
        if encoded.len() >= MAX_REQUEST_SIZE {
            return Err(WireError::SizeLimit {
                size: encoded.len(),
                limit: MAX_REQUEST_SIZE,
            });
        }

        // Register before writing: the response can be on its way back the
        // moment the frame leaves.
        let reference = request.ref_str().to_owned();
        let (reply_tx, mut reply_rx) = oneshot::channel();
        lock_pending(&self.pending).insert(reference.clone(), reply_tx);

        if let Err(error) = self.writer.send(Bytes::from(encoded)).await {
            lock_pending(&self.pending).remove(&reference);
            return Err(error);
        }

        match timeout {
            CallTimeout::Infinity => reply_rx.await.map_err(|_| WireError::ConnectionClosed)?,
            CallTimeout::After(duration) => {
                match tokio::time::timeout(duration, &mut reply_rx).await {
                    Ok(reply) => reply.map_err(|_| WireError::ConnectionClosed)?,
                    Err(_elapsed) => {
                        if lock_pending(&self.pending).remove(&reference).is_some() {
                            Err(WireError::Timeout)
                        } else {
                            // Someone else already claimed the entry: its
                            // reply is in flight and wins over the timer.
                            reply_rx.await.map_err(|_| WireError::ConnectionClosed)?
                        }
                    }
                }
            }
        }
    }

    /// Fire-and-forget: write the request without registering a pending
    /// entry or awaiting a reply. Returns whether the write succeeded.
    pub async fn cast(&self, request: &Request) -> bool {
        let encoded = match codec::encode(&request.to_term()) {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!("cast dropped, request does not encode: {error}");
                return false;
            }
        };
        self.writer.send(Bytes::from(encoded)).await.is_ok()
    }

    /// Cancel a pending call: fails it with [`WireError::Cancelled`] and
    /// removes its entry. Unknown or already-settled Refs are a no-op, so
    /// cancellation is idempotent. Never writes to the stream.
    pub fn cancel(&self, reference: &str) {
        if let Some(reply_tx) = lock_pending(&self.pending).remove(reference) {
            let _ = reply_tx.send(Err(WireError::Cancelled));
        }
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        lock_pending(&self.pending).len()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.read_task.abort();
        self.writer_task.abort();
    }
}

async fn read_loop<R>(mut reader: R, pending: &PendingTable, config: &ClientConfig) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::with_max_frame(config.max_frame_size);
    let mut buf = vec![0u8; config.read_buffer_size];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(error) => return Err(WireError::Io(error)),
        };

        for frame in frame_buffer.push(&buf[..n])? {
            dispatch_frame(&frame, pending, config.max_decode_depth);
        }
    }
}

fn dispatch_frame(frame: &[u8], pending: &PendingTable, max_decode_depth: usize) {
    let term = match codec::decode_with_depth(frame, max_decode_depth) {
        Ok(term) => term,
        Err(error) => {
            // Frames are length-delimited, so one undecodable payload does
            // not desynchronize the stream; drop it and keep reading.
            tracing::error!("dropping undecodable frame: {error}");
            return;
        }
    };

    let Some(response) = Response::from_term(term) else {
        tracing::warn!("dropping reply with unexpected shape");
        return;
    };

    let entry = lock_pending(pending).remove(response.ref_str());
    match entry {
        Some(reply_tx) => {
            // The receiver may have stopped waiting; that is its business.
            let _ = reply_tx.send(Ok(response));
        }
        None => {
            // Already timed out, cancelled, or from a prior connection.
            tracing::debug!(reference = response.ref_str(), "discarding unmatched reply");
        }
    }
}

fn fail_all_pending(pending: &PendingTable) {
    let entries: Vec<ReplySender> = {
        let mut table = lock_pending(pending);
        table.drain().map(|(_, reply_tx)| reply_tx).collect()
    };
    for reply_tx in entries {
        let _ = reply_tx.send(Err(WireError::ConnectionClosed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    async fn respond(server: &mut DuplexStream, reference: &str, payload: Term) {
        let response = Response::new(reference, payload);
        let encoded = codec::encode(&response.to_term()).unwrap();
        server
            .write_all(&crate::protocol::build_frame(&encoded))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cast_does_not_register_pending_entry() {
        let (client_io, _server) = duplex(4096);
        let client = Client::from_stream(client_io);

        let request = Request::new("simulation", "kill", vec![Term::int(1)]);
        assert!(client.cast(&request).await);
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_ref_is_noop() {
        let (client_io, _server) = duplex(4096);
        let client = Client::from_stream(client_io);

        client.cancel("no-such-ref");
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_call_rejected_before_write() {
        let (client_io, _server) = duplex(64);
        let client = Client::from_stream(client_io);

        // A 64-byte duplex would block a real write of this size, so the
        // call returning at all proves nothing was written.
        let request = Request::new(
            "algorithm",
            "compile",
            vec![Term::str("x".repeat(MAX_REQUEST_SIZE))],
        );
        let result = client.call(&request, CallTimeout::default()).await;
        assert!(matches!(result, Err(WireError::SizeLimit { .. })));
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_call_resolves_with_matching_response() {
        let (client_io, mut server) = duplex(4096);
        let client = Client::from_stream(client_io);

        let request = Request::new("algorithm", "compile", vec![Term::str("flood.erl")]);
        let reference = request.ref_str().to_owned();

        let call = client.call(&request, CallTimeout::Infinity);
        let reply = async {
            respond(&mut server, &reference, Term::atom("ok")).await;
        };

        let (result, ()) = tokio::join!(call, reply);
        let response = result.unwrap();
        assert_eq!(response.ref_str(), reference);
        assert!(response.payload().is_atom("ok"));
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_response_is_discarded() {
        let (client_io, mut server) = duplex(4096);
        let client = Client::from_stream(client_io);

        respond(&mut server, "stale-ref", Term::atom("ok")).await;

        // The connection stays healthy for subsequent calls.
        let request = Request::new("m", "f", vec![]);
        let reference = request.ref_str().to_owned();
        let call = client.call(&request, CallTimeout::Infinity);
        let reply = async {
            respond(&mut server, &reference, Term::int(1)).await;
        };
        let (result, ()) = tokio::join!(call, reply);
        assert_eq!(result.unwrap().payload(), &Term::int(1));
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_skipped() {
        let (client_io, mut server) = duplex(4096);
        let client = Client::from_stream(client_io);

        // Garbage frame, then a valid reply: the reader survives the former.
        server
            .write_all(&crate::protocol::build_frame(&[1, 2, 3]))
            .await
            .unwrap();

        let request = Request::new("m", "f", vec![]);
        let reference = request.ref_str().to_owned();
        let call = client.call(&request, CallTimeout::Infinity);
        let reply = async {
            respond(&mut server, &reference, Term::atom("ok")).await;
        };
        let (result, ()) = tokio::join!(call, reply);
        assert!(result.unwrap().payload().is_atom("ok"));
    }
}
