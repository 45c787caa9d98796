//! Upstream connection and response streaming
//!
//! This module connects to a plain-HTTP upstream, forwards a request head and
//! hands the response back as a status, a header map and a stream of body
//! chunks. Requests go out as HTTP/1.0 with `Connection: close`, so the
//! upstream never answers with a chunked body and the body simply ends at EOF.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ProxyConfig;
use crate::http::headers::{HeaderMap, find_crlf};
use crate::http::request::Request;
use crate::http::response::StatusCode;

/// Default buffer size for streaming
const BUFFER_SIZE: usize = 1024;

/// Largest upstream response head we are willing to buffer
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Hop-by-hop headers that are never forwarded
const HOP_BY_HOP: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Connection",
    "Transfer-Encoding",
    "Upgrade",
    "Host",
];

/// A plain-HTTP upstream server
#[derive(Debug, Clone)]
pub struct Upstream {
    base: url::Url,
    connect_timeout: Duration,
}

/// Response head from the upstream plus the still-open body stream
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    stream: TcpStream,
    buffer: BytesMut,
}

impl Upstream {
    pub fn new(base: url::Url, connect_timeout: Duration) -> Self {
        Self {
            base,
            connect_timeout,
        }
    }

    pub fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        Ok(Self::new(cfg.upstream_url()?, cfg.connect_timeout()))
    }

    pub fn base(&self) -> &url::Url {
        &self.base
    }

    /// Request target on the upstream for a local `path`
    pub fn target_for(&self, path: &str) -> String {
        let base_path = self.base.path().trim_end_matches('/');
        let target = format!("{}{}", base_path, path);
        if target.is_empty() {
            "/".to_string()
        } else {
            target
        }
    }

    fn host_header(&self) -> Option<String> {
        let host = self.base.host_str()?;
        Some(match self.base.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// Build the HTTP request bytes sent to the upstream for `path`
    pub fn build_http_request(&self, request: &Request, path: &str) -> Vec<u8> {
        let mut buffer = Vec::new();

        buffer.extend_from_slice(
            format!("{} {} HTTP/1.0\r\n", request.method(), self.target_for(path)).as_bytes(),
        );

        if let Some(host) = self.host_header() {
            buffer.extend_from_slice(format!("Host: {}\r\n", host).as_bytes());
        }

        for (key, value) in request.headers.iter() {
            if HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(key)) {
                continue;
            }
            buffer.extend_from_slice(format!("{}: {}\r\n", key, value).as_bytes());
        }

        buffer.extend_from_slice(b"Connection: close\r\n\r\n");
        buffer
    }

    /// Forward `request` to `path` on the upstream and read the response head
    pub async fn forward(&self, request: &Request, path: &str) -> Result<UpstreamResponse> {
        let host = self.base.host_str().context("Upstream URL missing host")?;
        let port = self.base.port_or_known_default().unwrap_or(80);
        let addr = format!("{}:{}", host, port);

        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .context("Connection timeout")?
            .with_context(|| format!("Failed to connect to upstream {}", addr))?;

        tracing::debug!(upstream = %addr, path, "Connected to upstream");

        let request_bytes = self.build_http_request(request, path);
        stream.write_all(&request_bytes).await?;
        stream.flush().await?;

        read_response_head(stream).await
    }
}

impl UpstreamResponse {
    /// Next piece of the response body, or `None` once the upstream closes
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if !self.buffer.is_empty() {
            return Ok(Some(self.buffer.split().freeze()));
        }

        self.buffer.reserve(BUFFER_SIZE);
        let n = self
            .stream
            .read_buf(&mut self.buffer)
            .await
            .context("Error reading upstream body")?;
        if n == 0 {
            return Ok(None);
        }

        Ok(Some(self.buffer.split().freeze()))
    }
}

async fn read_response_head(mut stream: TcpStream) -> Result<UpstreamResponse> {
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);
    let mut status = None;
    let mut headers = HeaderMap::new();
    let mut head_len = 0usize;

    loop {
        if status.is_none() {
            if let Some(idx) = find_crlf(&buffer) {
                head_len += idx + 2;
                let line = buffer.split_to(idx + 2);
                status = Some(parse_status_line(&line[..idx])?);
            }
        }

        if status.is_some() {
            let (n, done) = headers
                .parse(&buffer)
                .context("Invalid header in upstream response")?;
            buffer.advance(n);
            head_len += n;

            if done {
                break;
            }
            if n > 0 {
                continue;
            }
        }

        if head_len + buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("Upstream response headers too large");
        }

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            anyhow::bail!("Connection closed before complete response received");
        }
    }

    let status = status.context("Empty upstream response")?;

    Ok(UpstreamResponse {
        status,
        headers,
        stream,
        buffer,
    })
}

/// Parse `HTTP/1.x CODE [reason]`
pub fn parse_status_line(line: &[u8]) -> Result<StatusCode> {
    let line = std::str::from_utf8(line).context("Invalid UTF-8 in status line")?;
    let parts: Vec<&str> = line.splitn(3, ' ').collect();

    if parts.len() < 2 || !parts[0].starts_with("HTTP/") {
        anyhow::bail!("Invalid status line: {}", line);
    }

    let code: u16 = parts[1].parse().context("Invalid status code")?;
    Ok(StatusCode::from_u16(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_keeps_numeric_code() {
        assert_eq!(
            parse_status_line(b"HTTP/1.1 418 I'm a teapot").unwrap(),
            StatusCode::from_u16(418)
        );
        assert_eq!(parse_status_line(b"HTTP/1.0 200").unwrap(), StatusCode::OK);
        assert!(parse_status_line(b"garbage").is_err());
    }

    #[test]
    fn target_joins_base_path() {
        let upstream = Upstream::new(
            url::Url::parse("http://localhost:3000/api/").unwrap(),
            Duration::from_secs(1),
        );

        assert_eq!(upstream.target_for("/users?id=1"), "/api/users?id=1");
    }
}
