use crate::http::headers::{HeaderMap, find_crlf};
use crate::http::request::{HTTP_VERSION, Request, RequestLine};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("unsupported http version: {0}")]
    UnsupportedHttpVersion(String),

    #[error("malformed header line")]
    MalformedHeader,

    #[error("request in error state")]
    RequestInErrorState,

    #[error("connection closed before request was complete")]
    UnexpectedEof,

    #[error("request parsing failed")]
    RequestParsingFailed,

    #[error("request head exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initial,
    ParsingHeaders,
    Done,
    Error,
}

/// Incremental request-head parser.
///
/// Bytes are offered with [`feed`](Self::feed) or [`parse`](Self::parse);
/// the return value says how many of them were consumed. The caller drops
/// exactly that many bytes from the front of its buffer and offers the rest
/// again together with whatever arrives next. A partial line is never
/// consumed, so no byte is parsed twice and none is skipped.
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    line: Option<RequestLine>,
    headers: HeaderMap,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Initial,
            line: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    pub fn is_error(&self) -> bool {
        self.state == ParserState::Error
    }

    /// Performs a single parsing step: one request line or one header line.
    ///
    /// Returns `Ok(0)` when more input is needed or the parser is done.
    /// Any error moves the parser to [`ParserState::Error`] for good.
    pub fn feed(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        let result = match self.state {
            ParserState::Error => return Err(ParseError::RequestInErrorState),
            ParserState::Done => return Ok(0),
            ParserState::Initial => self.feed_request_line(buf),
            ParserState::ParsingHeaders => self.feed_header(buf),
        };

        if result.is_err() {
            self.state = ParserState::Error;
        }
        result
    }

    fn feed_request_line(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        match parse_request_line(buf)? {
            Some((line, n)) => {
                self.line = Some(line);
                self.state = ParserState::ParsingHeaders;
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn feed_header(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        let (n, done) = self.headers.parse(buf)?;
        if done {
            self.state = ParserState::Done;
        }
        Ok(n)
    }

    /// Calls [`feed`](Self::feed) on the unconsumed tail of `buf` until a step
    /// consumes nothing or the parser is done.
    ///
    /// The returned count is the sum of every step's count.
    pub fn parse(&mut self, buf: &[u8]) -> Result<usize, ParseError> {
        let mut total = 0;

        while !self.is_done() {
            let n = self.feed(&buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }

        Ok(total)
    }

    /// Hands out the parsed request once the parser is done.
    pub fn finish(self) -> Result<Request, ParseError> {
        match (self.state, self.line) {
            (ParserState::Done, Some(line)) => Ok(Request {
                line,
                headers: self.headers,
            }),
            (ParserState::Error, _) => Err(ParseError::RequestParsingFailed),
            _ => Err(ParseError::UnexpectedEof),
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the request line at the front of `buf`.
///
/// Returns `Ok(None)` if no CRLF has arrived yet, otherwise the line and
/// the number of bytes it occupies including the CRLF.
pub fn parse_request_line(buf: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(idx) = find_crlf(buf) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&buf[..idx]).map_err(|_| ParseError::MalformedRequestLine)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine);
    };
    if method.is_empty() || target.is_empty() {
        return Err(ParseError::MalformedRequestLine);
    }

    let version = match version.split('/').collect::<Vec<_>>().as_slice() {
        ["HTTP", v] if !v.is_empty() => *v,
        _ => return Err(ParseError::MalformedRequestLine),
    };
    if version != HTTP_VERSION {
        return Err(ParseError::UnsupportedHttpVersion(version.to_string()));
    }

    let request_line = RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        http_version: version.to_string(),
    };

    Ok(Some((request_line, idx + 2)))
}
