use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::handler::Handler;
use crate::http::reader::{ReadLimits, read_request};
use crate::http::writer::{ResponseWriter, WriterState};

/// One accepted connection, served with exactly one response.
///
/// The stream is owned by value and dropped on every exit path, which
/// closes the socket even if parsing fails or the handler panics.
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    limits: ReadLimits,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, peer: SocketAddr, limits: ReadLimits) -> Self {
        Self {
            stream,
            peer,
            limits,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Parses the request, lets `handler` respond, then closes the stream.
    ///
    /// A request that fails to parse gets no response at all. A handler error
    /// is rendered as the canonical error response, provided the handler had
    /// not started writing yet and no write to the stream has failed. A
    /// failed write is never retried: the stream is dropped without another
    /// byte.
    pub async fn run<H>(mut self, handler: &H) -> anyhow::Result<()>
    where
        H: Handler<S>,
    {
        let peer = self.peer;

        let request = read_request(&mut self.stream, self.limits)
            .await
            .with_context(|| format!("error reading request from {}", peer))?;

        tracing::debug!(
            peer = %peer,
            method = request.method(),
            target = request.target(),
            "Request parsed"
        );

        let mut writer = ResponseWriter::new(self.stream);

        let outcome = handler.handle(&mut writer, &request).await;

        if writer.has_failed() {
            let reason = match outcome {
                Ok(()) => "handler ignored the write failure".to_string(),
                Err(err) => err.to_string(),
            };
            anyhow::bail!("error writing response to {}: {}", peer, reason);
        }

        match outcome {
            Ok(()) if writer.is_finished() => {}
            Ok(()) => {
                tracing::warn!(
                    peer = %peer,
                    state = ?writer.state(),
                    "Handler returned without completing the response"
                );
            }
            Err(err) if writer.state() == WriterState::Init => {
                tracing::info!(
                    peer = %peer,
                    status = err.status.as_u16(),
                    target = request.target(),
                    "Handler reported an error"
                );
                err.write_to(&mut writer)
                    .await
                    .context("error writing handler error")?;
            }
            Err(err) => {
                anyhow::bail!(
                    "handler failed after the response was started ({:?}): {}",
                    writer.state(),
                    err
                );
            }
        }

        let mut stream = writer.into_inner();
        if let Err(e) = stream.shutdown().await {
            tracing::debug!(peer = %peer, error = %e, "Error shutting down stream");
        }

        Ok(())
    }
}
