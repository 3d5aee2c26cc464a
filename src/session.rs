use crate::config::WebSocketConfig;
use crate::error::Error;
use crate::event::ID;
use crate::frame::{read_frame, write_frame, Frame};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::{watch, Mutex};

/// Payload that ends a session when received. Clients of the original tooling
/// send the status code 1001 as the raw body of a data frame instead of a
/// proper close frame, so the pair is matched byte for byte.
pub const STOP_SENTINEL: [u8; 2] = [0x03, 0xE9];

/// Receives every successfully decoded, non-sentinel payload of one session.
pub trait PayloadHandler: Send {
    fn on_data(&mut self, payload: Vec<u8>);
}

/// Default handler: drops everything on the floor.
pub struct NoopHandler;

impl PayloadHandler for NoopHandler {
    fn on_data(&mut self, _payload: Vec<u8>) {}
}

/// The receive side of one upgraded connection. Owns the read half
/// exclusively for its lifetime, so no locking is needed in the loop.
pub struct Session<R: AsyncReadExt + Unpin = BufReader<ReadHalf<TcpStream>>> {
    id: ID,
    reader: R,
    shutdown: watch::Receiver<bool>,
    config: WebSocketConfig,
}

impl<R: AsyncReadExt + Unpin> Session<R> {
    pub fn new(id: ID, reader: R, shutdown: watch::Receiver<bool>, config: WebSocketConfig) -> Self {
        Self {
            id,
            reader,
            shutdown,
            config,
        }
    }

    pub fn id(&self) -> ID {
        self.id
    }

    /// Blocking receive loop of the session, run on the connection's own task.
    ///
    /// Decodes one frame at a time and hands the payload to the handler.
    /// Stops cleanly when the peer closes the stream, when the stop sentinel
    /// arrives, or when the shutdown signal flips; any other decode or socket
    /// error ends this session only and is returned to the caller.
    pub async fn run<H: PayloadHandler>(mut self, handler: &mut H) -> Result<(), Error> {
        let max_payload_size = self.config.max_payload_size.unwrap_or(usize::MAX);

        loop {
            select! {
                // Cancellation is checked between frame reads, so an external
                // shutdown unblocks the loop without tearing the socket down
                // from under it.
                _ = self.shutdown.changed() => break,
                result = read_frame(&mut self.reader, max_payload_size) => {
                    match result {
                        Ok(frame) if frame.payload == STOP_SENTINEL => break,
                        Ok(frame) => handler.on_data(frame.payload),
                        Err(Error::PeerClosed) => break,
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        Ok(())
    }
}

/// Push handle for one session, cloneable so the embedding event manager can
/// keep one while the server routes responses through another. All clones
/// share the write half; the frame codec runs under the lock so concurrent
/// sends can't interleave bytes.
pub struct SessionWriter<W: AsyncWrite + Unpin = WriteHalf<TcpStream>> {
    writer: Arc<Mutex<W>>,
}

impl<W: AsyncWrite + Unpin> Clone for SessionWriter<W> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
        }
    }
}

impl<W: AsyncWrite + Unpin> SessionWriter<W> {
    pub fn new(writer: Arc<Mutex<W>>) -> Self {
        Self { writer }
    }

    /// Frames the bytes as a final text frame and writes them out.
    ///
    /// Surrounding ASCII whitespace is trimmed first, and a payload that ends
    /// up empty is silently skipped, nothing reaches the socket. Callers can
    /// push heartbeat-ish blank updates without flooding the client.
    pub async fn send(&self, data: &[u8]) -> Result<(), Error> {
        let trimmed = data.trim_ascii();
        if trimmed.is_empty() {
            return Ok(());
        }

        self.write_frame(Frame::text(trimmed.to_vec())).await
    }

    /// Frames the bytes as a final binary frame, untouched. An empty payload
    /// is a no-op, matching `send`.
    pub async fn send_binary(&self, data: Vec<u8>) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }

        self.write_frame(Frame::binary(data)).await
    }

    /// Serializes the value to JSON text and sends it. This is the one
    /// explicit serialization step for structured payloads; the wire layer
    /// below only ever sees bytes, and the frame's declared length is the
    /// UTF-8 byte length of the serialized text.
    pub async fn send_json<T: Serialize>(&self, value: &T) -> Result<(), Error> {
        let text = serde_json::to_string(value)?;
        self.send(text.as_bytes()).await
    }

    /// Shuts the underlying socket down. Called once when the session ends.
    pub async fn close(&self) -> Result<(), Error> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }

    async fn write_frame(&self, frame: Frame) -> Result<(), Error> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, frame).await
    }
}
