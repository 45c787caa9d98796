//! Demonstration application served by the `httpwire` binary.
//!
//! - `/yourproblem` answers 400 with an HTML page
//! - `/myproblem` answers 500 with an HTML page
//! - `<proxy prefix>/<path>` is forwarded to the upstream and streamed back
//!   with `Transfer-Encoding: chunked`
//! - anything else answers 200 with an HTML page

use std::future::Future;

use tokio::io::AsyncWrite;

use crate::http::handler::{Handler, HandlerError};
use crate::http::request::Request;
use crate::http::response::{StatusCode, default_headers};
use crate::http::writer::ResponseWriter;
use crate::proxy::Upstream;

pub const HTML_400: &str = r#"<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>
"#;

pub const HTML_500: &str = r#"<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>
"#;

pub const HTML_200: &str = r#"<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>
"#;

pub struct DemoHandler {
    proxy_prefix: String,
    upstream: Upstream,
}

impl DemoHandler {
    pub fn new(proxy_prefix: impl Into<String>, upstream: Upstream) -> Self {
        Self {
            proxy_prefix: proxy_prefix.into(),
            upstream,
        }
    }

    /// The upstream path for `target`, if it falls under the proxy prefix.
    pub fn proxy_path<'t>(&self, target: &'t str) -> Option<&'t str> {
        target
            .strip_prefix(self.proxy_prefix.as_str())
            .filter(|rest| rest.starts_with('/'))
    }

    async fn serve_page<W>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let (status, body) = match request.target() {
            "/yourproblem" => (StatusCode::BAD_REQUEST, HTML_400),
            "/myproblem" => (StatusCode::INTERNAL_SERVER_ERROR, HTML_500),
            _ => (StatusCode::OK, HTML_200),
        };

        let mut headers = default_headers(body.len());
        headers.replace("Content-Type", "text/html");

        writer.write_status_line(status).await?;
        writer.write_headers(&headers).await?;
        writer.write_body(body.as_bytes()).await?;
        Ok(())
    }

    async fn serve_proxy<W>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
        path: &str,
    ) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        tracing::info!(upstream = %self.upstream.base(), path, "Proxying request");

        let mut response = match self.upstream.forward(request, path).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Error proxying request");
                return Err(HandlerError::internal("Failed to proxy request"));
            }
        };

        let mut headers = response.headers.clone();
        headers.remove("Content-Length");
        headers.remove("Transfer-Encoding");
        headers.replace("Connection", "close");
        headers.set("Transfer-Encoding", "chunked");

        writer.write_status_line(response.status).await?;
        writer.write_headers(&headers).await?;

        loop {
            match response.next_chunk().await {
                Ok(Some(chunk)) => {
                    tracing::debug!(bytes = chunk.len(), "Read chunk from upstream");
                    writer.write_chunked_body(&chunk).await?;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %format!("{:#}", e), "Upstream body ended early");
                    break;
                }
            }
        }

        writer.write_chunked_body_done().await?;
        tracing::info!(status = response.status.as_u16(), "Proxy request completed");
        Ok(())
    }
}

impl<W> Handler<W> for DemoHandler
where
    W: AsyncWrite + Unpin + Send,
{
    fn handle<'a>(
        &'a self,
        writer: &'a mut ResponseWriter<W>,
        request: &'a Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send + 'a {
        async move {
            match self.proxy_path(request.target()) {
                Some(path) => self.serve_proxy(writer, request, path).await,
                None => self.serve_page(writer, request).await,
            }
        }
    }
}
