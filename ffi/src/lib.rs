//! C-ABI wrapper around `blockpost-core`.
//!
//! # Overview
//! Exposes the blocking POST adapter through `extern "C"` functions so any
//! language with a C FFI can send a POST and receive the response body as a
//! C string without linking to Rust's HTTP stack directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `blockpost_post` is the one-call binary contract: a body or null.
//!   `blockpost_client_*` does the same through an opaque, reusable handle
//!   carrying configuration; `blockpost_client_post_ex` additionally reports
//!   an error code and HTTP status in a `BlockpostResult` envelope.
//! - The C caller owns all returned pointers and must call the matching
//!   `blockpost_free_*` / `blockpost_client_free` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_long};
use std::panic::{catch_unwind, AssertUnwindSafe};

use blockpost_core::{Poster, PosterConfig};
use tracing_subscriber::EnvFilter;

use types::*;

// ---------------------------------------------------------------------------
// One-shot POST
// ---------------------------------------------------------------------------

/// Send one blocking POST and return the response body.
///
/// `resolve_host` may be null or a `host:port:address` override. `timeout`
/// is in seconds; `0` disables it. `headers` may be null or a null-terminated
/// array of `"Name: Value"` strings, sent in order.
///
/// Returns null on any failure. The body is truncated at its first NUL byte.
/// The caller must free the returned string with `blockpost_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_post(
    url: *const c_char,
    body: *const c_char,
    resolve_host: *const c_char,
    timeout: c_long,
    headers: *const *const c_char,
) -> *mut c_char {
    let poster = Poster::new(PosterConfig::from_env());
    post_with(&poster, url, body, resolve_host, timeout, headers)
}

fn post_with(
    poster: &Poster,
    url: *const c_char,
    body: *const c_char,
    resolve_host: *const c_char,
    timeout: c_long,
    headers: *const *const c_char,
) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        let request = match unsafe { request_from_raw(url, body, resolve_host, timeout, headers) } {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(?err, "rejected POST arguments");
                return std::ptr::null_mut();
            }
        };
        match poster.execute(&request) {
            Ok(response) => c_string_lossy(response.body).into_raw(),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client configured from `BLOCKPOST_*` environment variables.
///
/// The caller must free the returned pointer with `blockpost_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_client_new() -> *mut BlockpostClient {
    catch_unwind(|| {
        let inner = Poster::new(PosterConfig::from_env());
        Box::into_raw(Box::new(BlockpostClient { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a client from a JSON config object such as
/// `{"user_agent":"my-app/1.0","content_type":"application/json"}`.
///
/// Returns null if `config_json` is null or malformed.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_client_new_with_config(config_json: *const c_char) -> *mut BlockpostClient {
    catch_unwind(|| {
        if config_json.is_null() {
            return std::ptr::null_mut();
        }
        let raw = match unsafe { CStr::from_ptr(config_json) }.to_str() {
            Ok(raw) => raw,
            Err(_) => return std::ptr::null_mut(),
        };
        match PosterConfig::from_json(raw) {
            Ok(config) => {
                let inner = Poster::new(config);
                tracing::debug!(
                    user_agent = %inner.config().user_agent,
                    content_type = %inner.config().content_type,
                    "client created from config"
                );
                Box::into_raw(Box::new(BlockpostClient { inner }))
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected client config");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `blockpost_client_new*`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_client_free(client: *mut BlockpostClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Client POST
// ---------------------------------------------------------------------------

/// Like `blockpost_post`, using `client`'s configuration.
///
/// Returns null if `client` is null or on any failure.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_client_post(
    client: *const BlockpostClient,
    url: *const c_char,
    body: *const c_char,
    resolve_host: *const c_char,
    timeout: c_long,
    headers: *const *const c_char,
) -> *mut c_char {
    if client.is_null() {
        return std::ptr::null_mut();
    }
    let client = unsafe { &*client };
    post_with(&client.inner, url, body, resolve_host, timeout, headers)
}

/// Like `blockpost_client_post`, but always returns a `BlockpostResult`
/// describing success (status and full body) or the failure category.
///
/// The caller must free the result with `blockpost_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_client_post_ex(
    client: *const BlockpostClient,
    url: *const c_char,
    body: *const c_char,
    resolve_host: *const c_char,
    timeout: c_long,
    headers: *const *const c_char,
) -> *mut BlockpostResult {
    catch_unwind(|| {
        if client.is_null() {
            return ArgError::Null("client").into_result();
        }
        let client = unsafe { &*client };
        let request = match unsafe { request_from_raw(url, body, resolve_host, timeout, headers) } {
            Ok(request) => request,
            Err(err) => return err.into_result(),
        };
        match client.inner.execute(&request) {
            Ok(response) => BlockpostResult::ok(response.status, response.body),
            Err(err) => BlockpostResult::from_error(&err),
        }
    })
    .unwrap_or_else(|_| {
        BlockpostResult::error(BlockpostErrorCode::Panic, "panic in blockpost_client_post_ex")
    })
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `warn`). Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_init_logging() -> bool {
    catch_unwind(|| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a string returned by `blockpost_post` / `blockpost_client_post`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

/// Free a `BlockpostResult` returned by `blockpost_client_post_ex`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn blockpost_free_result(result: *mut BlockpostResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.body.is_null() {
            let body = std::ptr::slice_from_raw_parts_mut(result.body, result.body_len + 1);
            drop(unsafe { Box::from_raw(body) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mock_server::ObservedRequest;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    /// Take ownership of a returned body string.
    fn take_string(ptr: *mut c_char) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        blockpost_free_string(ptr);
        Some(s)
    }

    #[test]
    fn post_echoes_body() {
        let addr = mock_server::spawn();
        let url = c(&format!("http://{addr}/echo"));
        let body = c("hello=world");

        let got = blockpost_post(url.as_ptr(), body.as_ptr(), std::ptr::null(), 5, std::ptr::null());
        assert_eq!(take_string(got).as_deref(), Some("hello=world"));
    }

    #[test]
    fn post_sends_header_array_in_order() {
        let addr = mock_server::spawn();
        let url = c(&format!("http://{addr}/inspect"));
        let body = c("");
        let first = c("X-Test: abc");
        let second = c("X-Other: def");
        let headers = [first.as_ptr(), second.as_ptr(), std::ptr::null()];

        let got = blockpost_post(url.as_ptr(), body.as_ptr(), std::ptr::null(), 5, headers.as_ptr());
        let observed: ObservedRequest = serde_json::from_str(&take_string(got).unwrap()).unwrap();
        assert_eq!(observed.header_values("x-test"), vec!["abc"]);
        assert!(observed.position("x-test") < observed.position("x-other"));
    }

    #[test]
    fn post_with_max_long_timeout_succeeds() {
        let addr = mock_server::spawn();
        let url = c(&format!("http://{addr}/echo"));
        let body = c("no deadline");

        let got = blockpost_post(url.as_ptr(), body.as_ptr(), std::ptr::null(), c_long::MAX, std::ptr::null());
        assert_eq!(take_string(got).as_deref(), Some("no deadline"));
    }

    #[test]
    fn post_with_resolve_override() {
        let addr = mock_server::spawn();
        let port = addr.port();
        let url = c(&format!("http://example.test:{port}/echo"));
        let body = c("resolved");
        let resolve = c(&format!("example.test:{port}:127.0.0.1"));

        let got = blockpost_post(url.as_ptr(), body.as_ptr(), resolve.as_ptr(), 5, std::ptr::null());
        assert_eq!(take_string(got).as_deref(), Some("resolved"));
    }

    #[test]
    fn post_null_url_returns_null() {
        let body = c("x");
        let got = blockpost_post(std::ptr::null(), body.as_ptr(), std::ptr::null(), 0, std::ptr::null());
        assert!(got.is_null());
    }

    #[test]
    fn post_connection_refused_returns_null() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = c(&format!("http://127.0.0.1:{port}/echo"));
        let body = c("x");

        let got = blockpost_post(url.as_ptr(), body.as_ptr(), std::ptr::null(), 5, std::ptr::null());
        assert!(got.is_null());
    }

    #[test]
    fn client_with_config_uses_user_agent() {
        let addr = mock_server::spawn();
        let config = c(r#"{"user_agent":"ffi-agent/1.0"}"#);
        let client = blockpost_client_new_with_config(config.as_ptr());
        assert!(!client.is_null());
        assert_eq!(unsafe { &*client }.inner.config().user_agent, "ffi-agent/1.0");

        let url = c(&format!("http://{addr}/inspect"));
        let body = c("");
        let got = blockpost_client_post(client, url.as_ptr(), body.as_ptr(), std::ptr::null(), 5, std::ptr::null());
        let observed: ObservedRequest = serde_json::from_str(&take_string(got).unwrap()).unwrap();
        assert_eq!(observed.header_values("user-agent"), vec!["ffi-agent/1.0"]);

        blockpost_client_free(client);
    }

    #[test]
    fn client_with_malformed_config_returns_null() {
        let config = c("{user_agent:");
        assert!(blockpost_client_new_with_config(config.as_ptr()).is_null());
        assert!(blockpost_client_new_with_config(std::ptr::null()).is_null());
    }

    #[test]
    fn client_post_null_client_returns_null() {
        let url = c("http://127.0.0.1:9/echo");
        let body = c("");
        let got = blockpost_client_post(
            std::ptr::null(),
            url.as_ptr(),
            body.as_ptr(),
            std::ptr::null(),
            0,
            std::ptr::null(),
        );
        assert!(got.is_null());
    }

    #[test]
    fn post_ex_reports_status_and_full_body() {
        let addr = mock_server::spawn();
        let client = blockpost_client_new();
        let url = c(&format!("http://{addr}/status/404"));
        let body = c("");

        let result = blockpost_client_post_ex(client, url.as_ptr(), body.as_ptr(), std::ptr::null(), 5, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, BlockpostErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.http_status, 404);
        let bytes = unsafe { std::slice::from_raw_parts(r.body, r.body_len + 1) };
        assert_eq!(bytes, b"status 404\0");

        blockpost_free_result(result);
        blockpost_client_free(client);
    }

    #[test]
    fn post_ex_reports_connect_failure() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = blockpost_client_new();
        let url = c(&format!("http://127.0.0.1:{port}/echo"));
        let body = c("x");

        let result = blockpost_client_post_ex(client, url.as_ptr(), body.as_ptr(), std::ptr::null(), 5, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, BlockpostErrorCode::Connect);
        assert!(!r.error_message.is_null());
        assert!(r.body.is_null());

        blockpost_free_result(result);
        blockpost_client_free(client);
    }

    #[test]
    fn post_ex_reports_invalid_resolve() {
        let client = blockpost_client_new();
        let url = c("http://example.test/echo");
        let body = c("");
        let resolve = c("example.test");

        let result = blockpost_client_post_ex(client, url.as_ptr(), body.as_ptr(), resolve.as_ptr(), 0, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, BlockpostErrorCode::InvalidArg);
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(msg.contains("missing port"), "{msg}");

        blockpost_free_result(result);
        blockpost_client_free(client);
    }

    #[test]
    fn post_ex_null_client_is_null_arg() {
        let url = c("http://127.0.0.1:9/echo");
        let body = c("");
        let result = blockpost_client_post_ex(
            std::ptr::null(),
            url.as_ptr(),
            body.as_ptr(),
            std::ptr::null(),
            0,
            std::ptr::null(),
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, BlockpostErrorCode::NullArg);
        blockpost_free_result(result);
    }

    #[test]
    fn init_logging_is_idempotent() {
        blockpost_init_logging();
        assert!(!blockpost_init_logging());
    }

    #[test]
    fn free_functions_accept_null() {
        blockpost_free_string(std::ptr::null_mut());
        blockpost_free_result(std::ptr::null_mut());
        blockpost_client_free(std::ptr::null_mut());
    }
}
