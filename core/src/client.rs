//! Blocking POST executor backed by `reqwest`.
//!
//! # Design
//! `Poster` holds only configuration. Each request acquires its own transport
//! client, configured for that request's timeout and resolve override, and
//! drops it before returning, so nothing is shared between calls and every
//! exit path releases the client and the partial body. The response body is
//! read as a sequence of chunks folded into a `ResponseBuffer`.
//!
//! Transport behaviour matches a bare libcurl easy handle:
//! redirects are not followed, any HTTP status is a completed exchange, and
//! a form content type is sent unless the caller set one.

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::Url;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::buffer::ResponseBuffer;
use crate::config::PosterConfig;
use crate::error::PostError;
use crate::http::{PostRequest, PostResponse};
use crate::resolve::ResolveOverride;

/// Synchronous POST adapter.
#[derive(Debug, Clone, Default)]
pub struct Poster {
    config: PosterConfig,
}

impl Poster {
    pub fn new(config: PosterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PosterConfig {
        &self.config
    }

    /// Send `request` and return the status and full body.
    ///
    /// Blocks the calling thread until the body is complete, the transport
    /// fails, or the request's timeout expires.
    pub fn execute(&self, request: &PostRequest) -> Result<PostResponse, PostError> {
        let request_id = Uuid::new_v4();
        let result = self.perform(request_id, request);
        if let Err(err) = &result {
            warn!(%request_id, url = %request.url, error = %err, "POST failed");
        }
        result
    }

    /// Send `request` and return its body as text.
    pub fn post(&self, request: &PostRequest) -> Result<String, PostError> {
        self.execute(request)?.into_string()
    }

    fn perform(&self, request_id: Uuid, request: &PostRequest) -> Result<PostResponse, PostError> {
        let url = Url::parse(&request.url).map_err(|e| PostError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        let headers = request.header_pairs()?;
        let transport = self.transport(&url, request)?;

        debug!(
            %request_id,
            url = %url,
            body_len = request.body.len(),
            headers = headers.len(),
            timeout_secs = request.timeout_secs,
            "sending POST"
        );

        let mut builder = transport.post(url);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if !request.has_header(CONTENT_TYPE.as_str()) {
            let content_type = HeaderValue::from_str(&self.config.content_type).map_err(|_| {
                PostError::InvalidHeader {
                    line: format!("Content-Type: {}", self.config.content_type),
                    reason: "invalid configured content type",
                }
            })?;
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .map_err(PostError::from_transport)?;
        let status = response.status().as_u16();

        let mut buffer = ResponseBuffer::new();
        let chunks = buffer.fill_from(response)?;
        debug!(%request_id, status, chunks, body_len = buffer.len(), "POST complete");

        Ok(PostResponse {
            status,
            body: buffer.into_bytes(),
        })
    }

    /// Build the transport client for one request.
    fn transport(&self, url: &Url, request: &PostRequest) -> Result<Client, PostError> {
        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .redirect(Policy::none())
            .timeout(request.timeout());
        if !self.config.system_proxy {
            builder = builder.no_proxy();
        }
        if let Some(entry) = &request.resolve {
            builder = apply_resolve(builder, url, entry);
        }
        builder.build().map_err(PostError::Client)
    }
}

fn apply_resolve(
    builder: reqwest::blocking::ClientBuilder,
    url: &Url,
    entry: &ResolveOverride,
) -> reqwest::blocking::ClientBuilder {
    if entry.matches(url) {
        debug!(resolve = %entry, "installing resolve override");
        builder.resolve_to_addrs(entry.host(), &entry.socket_addrs())
    } else {
        debug!(resolve = %entry, url = %url, "resolve override does not match request, ignored");
        builder
    }
}

/// Send one POST and return the body, or `None` on any failure.
///
/// `resolve_host` is a `host:port:address` override; `timeout_secs` of `0`
/// disables the timeout; `headers` are raw `Name: Value` lines. Configuration
/// comes from `PosterConfig::from_env`.
///
/// The body is returned for any HTTP status, but only if it is valid UTF-8.
/// A completed exchange whose body is not UTF-8 yields `None`; use
/// `Poster::execute` to get the raw bytes.
pub fn post(
    url: &str,
    body: &str,
    resolve_host: Option<&str>,
    timeout_secs: u64,
    headers: Option<&[&str]>,
) -> Option<String> {
    let build = || -> Result<PostRequest, PostError> {
        let mut request = PostRequest::new(url, body).with_timeout_secs(timeout_secs);
        if let Some(lines) = headers {
            request = request.with_headers(lines.iter().copied());
        }
        if let Some(entry) = resolve_host {
            request = request.with_resolve(entry.parse()?);
        }
        Ok(request)
    };

    let request = build()
        .inspect_err(|err| warn!(url, error = %err, "rejected POST request"))
        .ok()?;
    Poster::new(PosterConfig::from_env()).post(&request).ok()
}
