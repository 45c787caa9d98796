use std::future::Future;

use tokio::io::AsyncWrite;

use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::{ResponseWriter, WriteError};

/// A failure the application wants reported to the client.
///
/// Rendered as the status line, the default headers, and `message` as a
/// plain-text body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Writes the canonical error response through `writer`.
    pub async fn write_to<W>(&self, writer: &mut ResponseWriter<W>) -> Result<(), WriteError>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_status_line(self.status).await?;
        writer
            .write_headers(&default_headers(self.message.len()))
            .await?;
        writer.write_body(self.message.as_bytes()).await?;
        Ok(())
    }
}

impl From<WriteError> for HandlerError {
    fn from(err: WriteError) -> Self {
        HandlerError::internal(err.to_string())
    }
}

/// The application side of a connection.
///
/// A handler either drives `writer` to a complete response and returns
/// `Ok(())`, or returns a [`HandlerError`] without having written anything,
/// in which case the connection writes the canonical error response. If a
/// write to the stream failed, the connection is closed instead.
pub trait Handler<W>: Send + Sync + 'static
where
    W: AsyncWrite + Unpin + Send,
{
    fn handle<'a>(
        &'a self,
        writer: &'a mut ResponseWriter<W>,
        request: &'a Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send + 'a;
}
