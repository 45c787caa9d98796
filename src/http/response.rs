use std::fmt;

use crate::http::headers::HeaderMap;

/// HTTP status code.
///
/// Any numeric code can be carried so that upstream statuses pass through
/// unchanged. Only the codes with an associated constant have a reason phrase:
/// - `OK` (200)
/// - `BAD_REQUEST` (400)
/// - `INTERNAL_SERVER_ERROR` (500)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::from_u16(418).as_u16(), 418);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the reason phrase, if this is one of the built-in codes.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::response::StatusCode;
    /// assert_eq!(StatusCode::BAD_REQUEST.reason_phrase(), Some("Bad Request"));
    /// assert_eq!(StatusCode::from_u16(404).reason_phrase(), None);
    /// ```
    pub fn reason_phrase(&self) -> Option<&'static str> {
        match self.0 {
            200 => Some("OK"),
            400 => Some("Bad Request"),
            500 => Some("Internal Server Error"),
            _ => None,
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

/// Renders `200 OK`, or just `404` when no reason phrase is known.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason_phrase() {
            Some(reason) => write!(f, "{} {}", self.0, reason),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Headers the engine puts on every response it builds itself.
///
/// `Content-Type` can be swapped afterwards with [`HeaderMap::replace`].
pub fn default_headers(content_length: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.set("Content-Length", content_length.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

/// Default headers for a chunked body: `Content-Length` gives way to
/// `Transfer-Encoding: chunked`.
pub fn chunked_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.set("Transfer-Encoding", "chunked");
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}
