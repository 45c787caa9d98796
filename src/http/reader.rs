use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::parser::{ParseError, RequestParser};
use crate::http::request::Request;

/// Default number of bytes requested from the socket per read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Default cap on the size of a request line plus headers.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 8192;

/// Sizing policy for the accumulation buffer used by [`read_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    pub read_buffer_size: usize,
    pub max_request_size: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

/// Reads from `reader` until a complete request head has been parsed.
///
/// Bytes are accumulated in a growable buffer; after every parse pass the
/// consumed prefix is dropped and only the unparsed tail is kept. Fails with
/// [`ParseError::RequestTooLarge`] once the head seen so far (consumed bytes
/// plus the buffered tail) reaches `limits.max_request_size` without
/// completing, and with [`ParseError::UnexpectedEof`] if the stream ends
/// first. A `read_buffer_size` of zero is treated as one.
pub async fn read_request<R>(reader: &mut R, limits: ReadLimits) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RequestParser::new();
    let read_size = limits.read_buffer_size.max(1);
    let mut buf = BytesMut::with_capacity(read_size);
    let mut total_consumed = 0usize;

    while !parser.is_done() && !parser.is_error() {
        let seen = total_consumed + buf.len();
        if seen >= limits.max_request_size {
            return Err(ParseError::RequestTooLarge {
                limit: limits.max_request_size,
            });
        }

        let want = read_size.min(limits.max_request_size - seen);
        buf.reserve(want);

        let n = (&mut *reader).take(want as u64).read_buf(&mut buf).await?;
        if n == 0 {
            return Err(ParseError::UnexpectedEof);
        }
        tracing::trace!(read = n, buffered = buf.len(), "read request bytes");

        let consumed = parser.parse(&buf)?;
        buf.advance(consumed);
        total_consumed += consumed;
    }

    parser.finish()
}
