//! Error types for the POST adapter.
//!
//! # Design
//! The public contract of the adapter is binary (a body or nothing), but the
//! core keeps a typed error so failures can be logged and, at the C boundary,
//! mapped to an error code for callers that ask for one. Transport errors are
//! classified into timeout / connect / other because those are the three
//! outcomes callers of a blocking POST most often care about.

use std::io;

/// Errors returned by `Poster`.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    /// The URL could not be parsed.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A raw header line was not of the form `Name: Value`.
    #[error("invalid header line {line:?}: {reason}")]
    InvalidHeader { line: String, reason: &'static str },

    /// A resolve override was not of the form `host:port:address`.
    #[error("invalid resolve entry {entry:?}: {reason}")]
    InvalidResolve { entry: String, reason: &'static str },

    /// The per-request transport client could not be built.
    #[error("failed to build transport client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established (refused, unreachable, DNS).
    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Reading the response body failed part way through.
    #[error("failed to read response body: {0}")]
    Body(#[source] io::Error),

    /// The response buffer could not grow to hold the next chunk.
    #[error("out of memory growing response buffer to {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The response body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

impl PostError {
    /// Classify an error returned by the transport while sending.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PostError::Timeout
        } else if err.is_connect() {
            PostError::Connect(err)
        } else {
            PostError::Transport(err)
        }
    }

    /// Classify an error raised while reading the body. The blocking reader
    /// wraps transport errors in `io::Error`, so look inside for timeouts.
    pub(crate) fn from_body_read(err: io::Error) -> Self {
        let timed_out = err.kind() == io::ErrorKind::TimedOut
            || err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                .is_some_and(reqwest::Error::is_timeout);
        if timed_out {
            PostError::Timeout
        } else {
            PostError::Body(err)
        }
    }

    /// Whether the request was rejected before anything was sent.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PostError::InvalidUrl { .. }
                | PostError::InvalidHeader { .. }
                | PostError::InvalidResolve { .. }
        )
    }
}

/// Errors raised while loading a `PosterConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_io_error_maps_to_timeout() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "deadline");
        assert!(matches!(PostError::from_body_read(err), PostError::Timeout));
    }

    #[test]
    fn other_io_error_maps_to_body() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(PostError::from_body_read(err), PostError::Body(_)));
    }

    #[test]
    fn input_errors_are_flagged() {
        let err = PostError::InvalidHeader {
            line: "nope".to_string(),
            reason: "missing ':'",
        };
        assert!(err.is_invalid_input());
        assert!(!PostError::Timeout.is_invalid_input());
    }

    #[test]
    fn display_includes_offending_input() {
        let err = PostError::InvalidResolve {
            entry: "example.test".to_string(),
            reason: "missing port",
        };
        assert_eq!(
            err.to_string(),
            "invalid resolve entry \"example.test\": missing port"
        );
    }
}
