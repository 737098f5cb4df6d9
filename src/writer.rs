//! Dedicated writer task for outbound frames.
//!
//! A single task owns the write half of the stream and receives frames via
//! an mpsc channel, so concurrent callers never contend on the stream
//! itself. Each frame carries a completion channel: `send` resolves with the
//! actual write result, which is what lets a call fail immediately on write
//! failure and a cast report whether its write succeeded.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Result, WireError};
use crate::protocol::{encode_prefix, PREFIX_SIZE};

/// Default channel capacity for the outbound frame queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A frame queued for the writer task.
struct OutboundFrame {
    /// Pre-encoded length prefix.
    prefix: [u8; PREFIX_SIZE],
    /// Payload bytes: one encoded term.
    payload: Bytes,
    /// Resolved once the frame has been written and flushed (or refused).
    done: oneshot::Sender<Result<()>>,
}

/// Handle for queueing frames to the writer task. Cheaply cloneable.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl WriterHandle {
    /// Write one frame and wait until it is on the stream (flushed).
    ///
    /// Fails with the underlying I/O error if the write failed, or with
    /// `ConnectionClosed` if the writer task is gone.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        let frame = OutboundFrame {
            prefix: encode_prefix(payload.len() as u32),
            payload,
            done: done_tx,
        };
        self.tx
            .send(frame)
            .await
            .map_err(|_| WireError::ConnectionClosed)?;
        done_rx.await.map_err(|_| WireError::ConnectionClosed)?
    }
}

/// Spawn the writer task over the stream's write half.
pub fn spawn_writer_task<W>(writer: W, channel_capacity: usize) -> (WriterHandle, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(channel_capacity);
    let task = tokio::spawn(writer_loop(rx, writer));
    (WriterHandle { tx }, task)
}

async fn writer_loop<W>(mut rx: mpsc::Receiver<OutboundFrame>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        let result = write_frame(&mut writer, &frame).await;
        let failed = result.is_err();
        let _ = frame.done.send(result.map_err(WireError::Io));

        if failed {
            // The stream is broken; refuse whatever is still queued.
            rx.close();
            while let Some(stale) = rx.recv().await {
                let _ = stale.done.send(Err(WireError::ConnectionClosed));
            }
            return;
        }
    }
}

async fn write_frame<W>(writer: &mut W, frame: &OutboundFrame) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.prefix).await?;
    if !frame.payload.is_empty() {
        writer.write_all(&frame.payload).await?;
    }
    writer.flush().await
}
