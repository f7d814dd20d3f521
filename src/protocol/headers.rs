//! HTTP header handling for the upgrade exchange.
//!
//! This module covers both directions of the exchange: [`HeaderSet`] for the
//! outgoing request, [`PendingResponse`] for accumulating the server's bytes and
//! [`ParsedResponse`] for reading the completed header block.

use bytes::BytesMut;

use crate::error::{Error, Result};

/// Terminator of an HTTP header block.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Ordered header list.
///
/// Names keep the casing they were inserted with; lookups compare names
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Create an empty header set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `name` to `value`, replacing every existing entry with the same name.
    ///
    /// The first existing entry keeps its position; without one the header is
    /// appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => {
                self.entries[idx] = (name.clone(), value);
                let mut seen = 0usize;
                self.entries.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Append an entry without touching existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    /// Every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether any entry is named `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove every entry named `name`.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the comma-separated header `name` contains `token`
    /// (case-insensitive, whole-token match).
    #[must_use]
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name)
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }

    /// Write `Name: value\r\n` lines for every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderValue`] if a name or value contains CR or LF.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        for (name, value) in &self.entries {
            validate_header_name(name)?;
            validate_header_value(name, value)?;
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in iter {
            set.append(name, value);
        }
        set
    }
}

/// Validate that a header value does not contain CR or LF characters.
///
/// # Errors
/// Returns `Error::InvalidHeaderValue` if the value contains `\r` or `\n`.
pub fn validate_header_value(header_name: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::InvalidHeaderValue {
            header: header_name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

fn validate_header_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b':');
    if !valid {
        return Err(Error::InvalidHeaderValue {
            header: name.to_string(),
            reason: "not a valid header name".to_string(),
        });
    }
    Ok(())
}

/// Response bytes received so far for one attempt.
///
/// Never yields a [`ParsedResponse`] until the full header block, up to and
/// including `\r\n\r\n`, is present.
#[derive(Debug)]
pub struct PendingResponse {
    buf: BytesMut,
    max_size: usize,
}

impl PendingResponse {
    /// Create an empty buffer that refuses to grow past `max_size` bytes.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    /// Append received bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`] once the header block cannot fit.
    pub fn extend(&mut self, data: &[u8]) -> Result<()> {
        let size = self.buf.len() + data.len();
        if size > self.max_size && self.terminator_end().is_none() {
            let available = self.max_size.saturating_sub(self.buf.len());
            let fits = find_terminator(&self.buf, &data[..available.min(data.len())]);
            if !fits {
                return Err(Error::HandshakeTooLarge {
                    size,
                    max: self.max_size,
                });
            }
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Whether a complete header block has been received.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.terminator_end().is_some()
    }

    /// Bytes buffered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Parse the complete header block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if the block is incomplete or
    /// malformed.
    pub fn parse(&self) -> Result<ParsedResponse> {
        let end = self
            .terminator_end()
            .ok_or_else(|| Error::InvalidHandshake("Incomplete header block".into()))?;
        ParsedResponse::parse(&self.buf[..end])
    }

    fn terminator_end(&self) -> Option<usize> {
        self.buf
            .windows(HEADER_TERMINATOR.len())
            .position(|w| w == HEADER_TERMINATOR)
            .map(|pos| pos + HEADER_TERMINATOR.len())
    }
}

// Whether `head ++ tail` contains the terminator.
fn find_terminator(head: &[u8], tail: &[u8]) -> bool {
    let mut joined = Vec::with_capacity(head.len() + tail.len());
    joined.extend_from_slice(head);
    joined.extend_from_slice(tail);
    joined
        .windows(HEADER_TERMINATOR.len())
        .any(|w| w == HEADER_TERMINATOR)
}

/// A parsed HTTP response header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    status: u16,
    status_line: String,
    headers: HeaderSet,
    raw: Vec<u8>,
}

impl ParsedResponse {
    /// Parse a response header block from raw HTTP data.
    ///
    /// The block is read as bytes. Non-UTF-8 octets in the reason phrase or a
    /// header value (`obs-text`) are replaced with U+FFFD rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if:
    /// - The status line is missing or not `HTTP/<version> <3-digit code> ...`.
    /// - A header line has no `:` separator or a non-ASCII name.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut lines = data
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line));

        // Parse status line: "HTTP/1.1 101 Switching Protocols"
        let status_bytes = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| Error::InvalidHandshake("Empty response".into()))?;
        let status_line = String::from_utf8_lossy(status_bytes).into_owned();

        let mut parts = status_bytes.splitn(3, |&b| b == b' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with(b"HTTP/") {
            return Err(Error::InvalidHandshake(format!(
                "Invalid status line: {}",
                status_line
            )));
        }
        let code = parts.next().unwrap_or_default();
        if code.len() != 3 || !code.iter().all(u8::is_ascii_digit) {
            return Err(Error::InvalidHandshake(format!(
                "Invalid status code: {}",
                String::from_utf8_lossy(code)
            )));
        }
        let status = code
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));

        let mut headers = HeaderSet::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let malformed = || {
                Error::InvalidHandshake(format!(
                    "Malformed header line: {}",
                    String::from_utf8_lossy(line)
                ))
            };
            let colon = line.iter().position(|&b| b == b':').ok_or_else(malformed)?;
            let name = std::str::from_utf8(&line[..colon])
                .ok()
                .filter(|n| n.is_ascii())
                .ok_or_else(malformed)?;
            let value = String::from_utf8_lossy(&line[colon + 1..]);
            headers.append(name.trim(), value.trim());
        }

        Ok(Self {
            status,
            status_line,
            headers,
            raw: data.to_vec(),
        })
    }

    /// Numeric status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The full status line, e.g. `HTTP/1.1 403 Forbidden`.
    #[must_use]
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// First value of header `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The raw header block as received.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}
