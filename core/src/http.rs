//! Request and response values for the POST adapter.
//!
//! # Design
//! These types describe one POST as plain data. Headers stay as the raw
//! `Name: Value` lines the caller supplied, in the caller's order; they are
//! only split into name and value when handed to the transport. All fields
//! use owned types so values can be built on one side of the C boundary and
//! consumed on the other.

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::PostError;
use crate::resolve::ResolveOverride;

/// Longest timeout handed to the transport. Larger values are clamped so the
/// transport's deadline (`now + timeout`) stays representable.
const MAX_TIMEOUT_SECS: u64 = u32::MAX as u64;

/// One POST request described as plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRequest {
    pub url: String,
    pub body: Vec<u8>,
    pub resolve: Option<ResolveOverride>,
    /// Upper bound on the whole exchange. `0` means no limit; values above
    /// `u32::MAX` seconds are clamped to it.
    pub timeout_secs: u64,
    /// Raw `Name: Value` lines, sent in this order.
    pub headers: Vec<String>,
}

impl PostRequest {
    pub fn new(url: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.to_string(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    pub fn with_headers<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn with_resolve(mut self, entry: ResolveOverride) -> Self {
        self.resolve = Some(entry);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The timeout to hand the transport; `None` disables it.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs.min(MAX_TIMEOUT_SECS)))
    }

    /// Whether any header line sets `name` (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|line| {
            line.split_once(':')
                .is_some_and(|(line_name, _)| line_name.trim().eq_ignore_ascii_case(name))
        })
    }

    /// Split every header line, preserving order.
    pub fn header_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>, PostError> {
        self.headers.iter().map(|line| split_header_line(line)).collect()
    }
}

/// Split a raw `Name: Value` line at the first colon. Whitespace around the
/// value is trimmed; an empty value is allowed.
pub fn split_header_line(line: &str) -> Result<(HeaderName, HeaderValue), PostError> {
    let invalid = |reason| PostError::InvalidHeader {
        line: line.to_string(),
        reason,
    };
    let (name, value) = line.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("empty header name"));
    }
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid("invalid header name"))?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid("invalid header value"))?;
    Ok((name, value))
}

/// The outcome of a completed exchange. Any status counts as completed; the
/// adapter does not treat 4xx/5xx as failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl PostResponse {
    /// The body as UTF-8 text.
    pub fn into_string(self) -> Result<String, PostError> {
        Ok(String::from_utf8(self.body)?)
    }
}
