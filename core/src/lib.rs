//! Blocking HTTP POST adapter.
//!
//! # Overview
//! Sends one POST (optional raw header lines, optional per-request DNS
//! override, optional timeout) and returns the full response body. The
//! transport is `reqwest`'s blocking client; this crate only configures it
//! and folds the streamed body into one buffer.
//!
//! # Design
//! - `Poster` is stateless apart from its `PosterConfig`; every request gets
//!   its own transport client that is dropped before the call returns.
//! - The typed API (`Poster::execute` / `Poster::post`) reports a `PostError`;
//!   the free function `post` collapses every failure to `None`.
//! - Types use owned `String` / `Vec` fields so the C wrapper in `ffi/` can
//!   build requests without lifetime concerns.

pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resolve;

pub use buffer::ResponseBuffer;
pub use client::{post, Poster};
pub use config::{PosterConfig, DEFAULT_CONTENT_TYPE, DEFAULT_USER_AGENT};
pub use error::{ConfigError, PostError};
pub use http::{split_header_line, PostRequest, PostResponse};
pub use resolve::ResolveOverride;
