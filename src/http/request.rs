use std::fmt;

use crate::http::headers::HeaderMap;

/// The only protocol version the parser accepts.
pub const HTTP_VERSION: &str = "1.1";

/// The first line of a request: `METHOD TARGET HTTP/1.1`.
///
/// All three fields are non-empty. `http_version` holds the part after
/// `HTTP/`, so for every accepted request it is `"1.1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Method token, e.g. `GET`. Not checked against a known set.
    pub method: String,
    /// Raw request target (path and query), not percent-decoded.
    pub target: String,
    pub http_version: String,
}

/// A fully parsed request head.
///
/// Only produced once the parser has seen the blank line that ends the
/// header block, so every `Request` is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub line: RequestLine,
    pub headers: HeaderMap,
}

impl Request {
    pub fn method(&self) -> &str {
        &self.line.method
    }

    pub fn target(&self) -> &str {
        &self.line.target
    }

    /// Retrieves a header value by name (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request line:")?;
        writeln!(f, "- Method: {}", self.line.method)?;
        writeln!(f, "- Target: {}", self.line.target)?;
        writeln!(f, "- Version: {}", self.line.http_version)?;

        writeln!(f, "Headers:")?;
        let mut headers: Vec<_> = self.headers.iter().collect();
        headers.sort_by(|a, b| a.0.cmp(b.0));
        for (k, v) in headers {
            writeln!(f, "- {}: {}", k, v)?;
        }

        Ok(())
    }
}

/// Builder for constructing Request objects outside the parser.
pub struct RequestBuilder {
    method: Option<String>,
    target: Option<String>,
    headers: HeaderMap,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.headers.set(key, value);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let method = self.method.filter(|m| !m.is_empty()).ok_or("method missing")?;
        let target = self.target.filter(|t| !t.is_empty()).ok_or("target missing")?;

        Ok(Request {
            line: RequestLine {
                method,
                target,
                http_version: HTTP_VERSION.to_string(),
            },
            headers: self.headers,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
