use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::HeaderMap;
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";
const CHUNKED_TERMINATOR: &[u8] = b"0\r\n\r\n";

/// Progress of a response through its wire sections.
///
/// Transitions only move forward, one step at a time. A chunked body keeps
/// the writer in `HeadersWritten` until the terminating chunk is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Init,
    StatusWritten,
    HeadersWritten,
    BodyWritten,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("{operation} called out of order (writer is in {state:?})")]
    OutOfOrderWrite {
        operation: &'static str,
        state: WriterState,
    },

    #[error("error writing status line: {0}")]
    StatusLineWriteFailed(#[source] io::Error),

    #[error("error writing headers: {0}")]
    HeaderWriteFailed(#[source] io::Error),

    #[error("error writing body: {0}")]
    BodyWriteFailed(#[source] io::Error),

    #[error("{operation} called after an earlier write failed")]
    SinkFailed { operation: &'static str },
}

/// Writes one response onto `W`, enforcing status line -> headers -> body.
///
/// An out-of-order call fails with [`WriteError::OutOfOrderWrite`] before
/// touching the sink, and leaves the state unchanged. Once the sink returns
/// an error the writer is failed for good: the state stays where it was and
/// every later call fails with [`WriteError::SinkFailed`].
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
    chunked: bool,
    failed: bool,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::Init,
            chunked: false,
            failed: false,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// True once the response has been written completely.
    pub fn is_finished(&self) -> bool {
        self.state == WriterState::BodyWritten
    }

    /// True once a write to the sink has failed.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn expect_state(
        &self,
        expected: WriterState,
        operation: &'static str,
    ) -> Result<(), WriteError> {
        if self.failed {
            return Err(WriteError::SinkFailed { operation });
        }
        if self.state != expected {
            return Err(WriteError::OutOfOrderWrite {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    async fn send(
        &mut self,
        bytes: &[u8],
        flush: bool,
        wrap: fn(io::Error) -> WriteError,
    ) -> Result<(), WriteError> {
        let mut result = self.sink.write_all(bytes).await;
        if result.is_ok() && flush {
            result = self.sink.flush().await;
        }
        result.map_err(|e| {
            self.failed = true;
            wrap(e)
        })
    }

    /// Writes `HTTP/1.1 <code> [reason]\r\n`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.expect_state(WriterState::Init, "write_status_line")?;

        let line = format!("{} {}\r\n", HTTP_VERSION, status);
        self.send(line.as_bytes(), false, WriteError::StatusLineWriteFailed).await?;

        self.state = WriterState::StatusWritten;
        Ok(())
    }

    /// Writes every header as `Name: Value\r\n` in insertion order, then the
    /// blank line that ends the head.
    pub async fn write_headers(&mut self, headers: &HeaderMap) -> Result<(), WriteError> {
        self.expect_state(WriterState::StatusWritten, "write_headers")?;

        let mut buf = Vec::new();
        for (k, v) in headers.iter() {
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(v.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"\r\n");

        self.send(&buf, false, WriteError::HeaderWriteFailed).await?;

        self.state = WriterState::HeadersWritten;
        Ok(())
    }

    /// Writes a fixed-length body verbatim.
    ///
    /// The caller is responsible for a matching `Content-Length` header.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        self.expect_state(WriterState::HeadersWritten, "write_body")?;
        if self.chunked {
            return Err(WriteError::OutOfOrderWrite {
                operation: "write_body",
                state: self.state,
            });
        }

        self.send(body, true, WriteError::BodyWriteFailed).await?;

        self.state = WriterState::BodyWritten;
        Ok(body.len())
    }

    /// Writes `data` as one chunk: `<hex len>\r\n<data>\r\n`.
    ///
    /// An empty slice writes nothing, since a zero-length chunk would end
    /// the body.
    pub async fn write_chunked_body(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        self.expect_state(WriterState::HeadersWritten, "write_chunked_body")?;
        self.chunked = true;

        if data.is_empty() {
            return Ok(0);
        }

        let mut buf = Vec::with_capacity(data.len() + 12);
        buf.extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
        buf.extend_from_slice(data);
        buf.extend_from_slice(b"\r\n");

        self.send(&buf, false, WriteError::BodyWriteFailed).await?;

        Ok(data.len())
    }

    /// Writes the terminating `0\r\n\r\n` chunk and completes the response.
    pub async fn write_chunked_body_done(&mut self) -> Result<usize, WriteError> {
        self.expect_state(WriterState::HeadersWritten, "write_chunked_body_done")?;

        self.send(CHUNKED_TERMINATOR, true, WriteError::BodyWriteFailed).await?;

        self.chunked = false;
        self.state = WriterState::BodyWritten;
        Ok(CHUNKED_TERMINATOR.len())
    }
}
