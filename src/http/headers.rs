use crate::http::parser::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Case-insensitive, insertion-ordered header collection.
///
/// Repeated names are folded into a single entry whose values are joined
/// with `", "`. The spelling of the first occurrence is kept for output, so
/// a map built with `Content-Length` is written back as `Content-Length`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Looks up a header value by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Adds a value, joining it onto any existing value with `", "`.
    pub fn set(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => {
                let existing = &mut self.entries[i].1;
                existing.push_str(", ");
                existing.push_str(value.as_ref());
            }
            None => self.entries.push((name, value.as_ref().to_string())),
        }
    }

    /// Replaces any existing value. The entry keeps its original position.
    pub fn replace(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses at most one CRLF-terminated header line from the front of `buf`.
    ///
    /// Returns `(consumed, done)`:
    ///
    /// - `(0, false)` when `buf` holds no complete line yet. Nothing is consumed,
    ///   so the same bytes must be offered again once more data has arrived.
    /// - `(2, true)` when the line is empty, i.e. the blank line that ends the
    ///   header block.
    /// - `(line_len + 2, false)` after a `name: value` line was merged into the map.
    ///
    /// No state is kept between calls; each call scans from the start of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(idx) = find_crlf(buf) else {
            return Ok((0, false));
        };

        if idx == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = std::str::from_utf8(&buf[..idx]).map_err(|_| ParseError::MalformedHeader)?;
        let (name, value) = parse_header_line(line)?;
        self.set(name, value);

        Ok((idx + CRLF.len(), false))
    }
}

pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}

fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (name, value) = line.split_once(':').ok_or(ParseError::MalformedHeader)?;

    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ParseError::MalformedHeader);
    }

    // Exactly one leading space belongs to the separator.
    let value = value.strip_prefix(' ').unwrap_or(value);

    Ok((name, value))
}
