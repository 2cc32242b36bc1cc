//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The C surface passes requests as loose arguments (C strings, a
//! NULL-terminated header array, a `long` timeout) and receives either a
//! plain `char*` body or a heap-allocated `BlockpostResult`. Conversion from
//! raw arguments to a core `PostRequest` lives here to keep `lib.rs` focused
//! on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_long};

use blockpost_core::{PostError, PostRequest, Poster, ResolveOverride};

/// Opaque handle to a configured `Poster`. C callers receive a pointer to
/// this and pass it back into every `blockpost_client_*` function.
pub struct BlockpostClient {
    pub(crate) inner: Poster,
}

/// Error codes returned in `BlockpostResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockpostErrorCode {
    Ok = 0,
    NullArg = 1,
    InvalidArg = 2,
    Timeout = 3,
    Connect = 4,
    Transport = 5,
    OutOfMemory = 6,
    Panic = 7,
}

impl From<&PostError> for BlockpostErrorCode {
    fn from(err: &PostError) -> Self {
        match err {
            _ if err.is_invalid_input() => BlockpostErrorCode::InvalidArg,
            PostError::Timeout => BlockpostErrorCode::Timeout,
            PostError::Connect(_) => BlockpostErrorCode::Connect,
            PostError::OutOfMemory { .. } => BlockpostErrorCode::OutOfMemory,
            _ => BlockpostErrorCode::Transport,
        }
    }
}

/// Result envelope for `blockpost_client_post_ex`.
///
/// On success `error_code` is `Ok`, `error_message` is null, `http_status`
/// is the response status and `body` holds `body_len` bytes followed by a
/// NUL terminator (the body itself may contain NUL bytes). On failure
/// `error_code` describes the category, `error_message` is a human-readable
/// C string and `body` is null.
#[repr(C)]
pub struct BlockpostResult {
    pub error_code: BlockpostErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub body: *mut u8,
    pub body_len: usize,
}

impl BlockpostResult {
    /// Build a success result owning a copy of `body` plus a terminator.
    pub(crate) fn ok(status: u16, mut body: Vec<u8>) -> *mut Self {
        let body_len = body.len();
        body.push(0);
        let body = Box::into_raw(body.into_boxed_slice()) as *mut u8;
        Box::into_raw(Box::new(BlockpostResult {
            error_code: BlockpostErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: status,
            body,
            body_len,
        }))
    }

    pub(crate) fn error(code: BlockpostErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(BlockpostResult {
            error_code: code,
            error_message: c_string_lossy(msg.as_bytes().to_vec()).into_raw(),
            http_status: 0,
            body: std::ptr::null_mut(),
            body_len: 0,
        }))
    }

    pub(crate) fn from_error(err: &PostError) -> *mut Self {
        Self::error(err.into(), &err.to_string())
    }
}

/// Why raw C arguments could not become a `PostRequest`.
#[derive(Debug)]
pub(crate) enum ArgError {
    Null(&'static str),
    NotUtf8(&'static str),
    NegativeTimeout(c_long),
    Invalid(PostError),
}

impl ArgError {
    pub(crate) fn into_result(self) -> *mut BlockpostResult {
        match self {
            ArgError::Null(name) => {
                BlockpostResult::error(BlockpostErrorCode::NullArg, &format!("null argument: {name}"))
            }
            ArgError::NotUtf8(name) => BlockpostResult::error(
                BlockpostErrorCode::InvalidArg,
                &format!("argument is not valid UTF-8: {name}"),
            ),
            ArgError::NegativeTimeout(secs) => BlockpostResult::error(
                BlockpostErrorCode::InvalidArg,
                &format!("timeout must not be negative: {secs}"),
            ),
            ArgError::Invalid(err) => BlockpostResult::from_error(&err),
        }
    }
}

/// Read a required C string argument.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn required_str<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str, ArgError> {
    if ptr.is_null() {
        return Err(ArgError::Null(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| ArgError::NotUtf8(name))
}

/// Read an optional C string argument; null means absent.
///
/// # Safety
/// As `required_str`.
unsafe fn optional_str<'a>(ptr: *const c_char, name: &'static str) -> Result<Option<&'a str>, ArgError> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { required_str(ptr, name) }.map(Some)
}

/// Convert the raw `post` arguments into a core request.
///
/// # Safety
/// Every non-null pointer must reference a NUL-terminated string; `headers`,
/// when non-null, must be an array of such strings terminated by a null
/// pointer.
pub(crate) unsafe fn request_from_raw(
    url: *const c_char,
    body: *const c_char,
    resolve_host: *const c_char,
    timeout: c_long,
    headers: *const *const c_char,
) -> Result<PostRequest, ArgError> {
    let url = unsafe { required_str(url, "url") }?;
    let body = unsafe { required_str(body, "body") }?;
    let resolve = unsafe { optional_str(resolve_host, "resolve_host") }?;
    let timeout_secs = u64::try_from(timeout).map_err(|_| ArgError::NegativeTimeout(timeout))?;

    let mut request = PostRequest::new(url, body).with_timeout_secs(timeout_secs);
    if !headers.is_null() {
        let mut cursor = headers;
        loop {
            let line = unsafe { *cursor };
            if line.is_null() {
                break;
            }
            request = request.with_header(unsafe { required_str(line, "headers") }?);
            cursor = unsafe { cursor.add(1) };
        }
    }
    if let Some(entry) = resolve {
        let entry: ResolveOverride = entry.parse().map_err(ArgError::Invalid)?;
        request = request.with_resolve(entry);
    }
    Ok(request)
}

/// Build a C string from `bytes`, stopping at the first NUL the way `%s`
/// copies do.
pub(crate) fn c_string_lossy(mut bytes: Vec<u8>) -> CString {
    if let Some(end) = bytes.iter().position(|b| *b == 0) {
        bytes.truncate(end);
    }
    CString::new(bytes).unwrap_or_default()
}
