//! Line transport
//!
//! Wraps a duplex byte stream in one `BufReader` that lives as long as the
//! session, so bytes buffered past the current line are kept for the next read.

use crate::error::{PowError, PowResult};
use crate::presentation::message::{self, Message, Opcode};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Longest accepted line, newline included
pub const MAX_LINE_LEN: u64 = 4096;

/// Message-oriented view over a byte stream
#[derive(Debug)]
pub struct MessageStream<S> {
    inner: BufReader<S>,
}

impl<S> MessageStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: BufReader::new(stream),
        }
    }

    /// Read one newline-terminated line
    ///
    /// A peer that closes before sending anything yields `ConnectionClosed`.
    /// An overlong line is consumed through its newline and then reported, so
    /// its tail never reads as a message of its own.
    pub async fn read_line(&mut self) -> PowResult<String> {
        let mut raw = Vec::new();
        let read = (&mut self.inner)
            .take(MAX_LINE_LEN)
            .read_until(b'\n', &mut raw)
            .await?;
        if read == 0 {
            return Err(PowError::ConnectionClosed);
        }
        if raw.last() != Some(&b'\n') && read as u64 == MAX_LINE_LEN {
            self.discard_line().await?;
            return Err(PowError::MalformedMessage(format!(
                "line exceeds {MAX_LINE_LEN} bytes"
            )));
        }
        String::from_utf8(raw).map_err(|_| PowError::MalformedMessage("line is not UTF-8".into()))
    }

    /// Skip input up to and including the next newline, or to end of stream
    async fn discard_line(&mut self) -> PowResult<()> {
        loop {
            let buf = self.inner.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.inner.consume(end + 1);
                    return Ok(());
                }
                None => {
                    let len = buf.len();
                    self.inner.consume(len);
                }
            }
        }
    }

    /// Read and decode the next message
    pub async fn read_message(&mut self) -> PowResult<Message> {
        let line = self.read_line().await?;
        let message = Message::decode(&line)?;
        tracing::debug!(opcode = %message.opcode, payload = %message.payload, "recv");
        Ok(message)
    }

    /// Write one message and flush it
    pub async fn send(&mut self, opcode: Opcode, payload: &str) -> PowResult<()> {
        let line = message::encode(opcode, payload);
        let stream = self.inner.get_mut();
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        tracing::debug!(%opcode, payload, "sent");
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        self.inner.get_ref()
    }

    /// Raw access for writes; reading through it would bypass the line buffer
    pub fn get_mut(&mut self) -> &mut S {
        self.inner.get_mut()
    }

    /// Give back the stream; buffered unread bytes are dropped
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}
