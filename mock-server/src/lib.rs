use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the server saw for a request to `/inspect`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservedRequest {
    pub method: String,
    pub host: Option<String>,
    /// Header pairs in the order they arrived, names lowercased.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ObservedRequest {
    /// All values received for `name`, in arrival order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

#[derive(Deserialize)]
pub struct ChunkParams {
    #[serde(default = "default_parts")]
    pub parts: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_parts() -> usize {
    4
}

fn default_size() -> usize {
    1024
}

#[derive(Deserialize)]
pub struct DelayParams {
    #[serde(default)]
    pub ms: u64,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", post(echo))
        .route("/chunked", post(chunked))
        .route("/delay", post(delay))
        .route("/inspect", post(inspect))
        .route("/status/{code}", post(status))
        .route("/redirect", post(redirect))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Start the server on a random loopback port in a background thread with its
/// own runtime, and return the bound address. Intended for blocking tests.
pub fn spawn() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = std_listener.local_addr().expect("local addr");
    std_listener.set_nonblocking(true).expect("set nonblocking");

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime");
        rt.block_on(async {
            let listener = TcpListener::from_std(std_listener)?;
            run(listener).await
        })
        .expect("mock server stopped");
    });

    addr
}

/// Bytes produced by `/chunked?parts={parts}&size={size}`: chunk `i` is `size`
/// copies of the letter `'a' + i % 26`.
pub fn chunk_pattern(parts: usize, size: usize) -> Vec<Vec<u8>> {
    (0..parts)
        .map(|i| vec![b'a' + (i % 26) as u8; size])
        .collect()
}

async fn echo(body: Bytes) -> Bytes {
    tracing::debug!(len = body.len(), "echo");
    body
}

async fn chunked(Query(params): Query<ChunkParams>) -> Response {
    let chunks = chunk_pattern(params.parts, params.size)
        .into_iter()
        .map(Ok::<_, std::io::Error>);
    Body::from_stream(tokio_stream::iter(chunks)).into_response()
}

async fn delay(Query(params): Query<DelayParams>, body: Bytes) -> Bytes {
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    body
}

async fn inspect(method: Method, headers: HeaderMap, body: Bytes) -> Json<ObservedRequest> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(ObservedRequest {
        method: method.to_string(),
        host,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "invalid status").into_response(),
    }
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/echo")], "redirecting")
}
