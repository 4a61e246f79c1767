// src/fetch/http.rs
// =============================================================================
// This module downloads the one page we extract links from.
//
// Key functionality:
// - Builds a reqwest client with a fixed set of headers and a timeout
// - Sends a single GET request (redirects are followed by reqwest itself)
// - Accepts only HTTP 200; anything else is reported and extraction skipped
// - Hands the body over as a stream, without reading it into memory first
//
// We ask for gzip ourselves (Accept-Encoding: gzip) and deliberately do NOT
// enable reqwest's own decompression, so the extractor sees the raw body and
// picks the decoder from Content-Encoding.
//
// Rust concepts:
// - async/await: The request itself is async (tokio + reqwest)
// - Streams: The body arrives as a stream of byte chunks
// - thiserror: Typed errors the caller can match on
// =============================================================================

use std::io;
use std::time::Duration;

use futures::TryStreamExt; // gives us .map_err() on streams
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_CHARSET, ACCEPT_ENCODING, CACHE_CONTROL, CONNECTION,
    CONTENT_ENCODING, USER_AGENT,
};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tracing::{debug, info};
use url::Url;

pub const USER_AGENT_VALUE: &str = "LinkTracker1.0.0";

// Request-level timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error occurred with status {} for {url}", .status.as_u16())]
    Status { url: String, status: StatusCode },
}

// A successful (HTTP 200) response whose body has not been read yet
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    /// Raw Content-Encoding header value, if the server sent one
    pub content_encoding: Option<String>,
    response: Response,
}

impl Page {
    // Turns the body into an AsyncRead
    //
    // Chunks are pulled from the network only as the reader is read.
    pub fn into_reader(self) -> impl AsyncRead + Send + Unpin + 'static {
        let stream = self
            .response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        StreamReader::new(Box::pin(stream))
    }
}

// The headers every request carries
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
    headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf8"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers
}

// Creates the HTTP client
//
// Parameters:
//   timeout: applies to the whole request, including reading the body
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .default_headers(default_headers())
        .timeout(timeout)
        .build()
        .map_err(FetchError::Client)
}

// Performs the GET request
//
// Returns: Page on HTTP 200
// Errors:
//   InvalidUrl if `url` does not parse
//   Request for network problems and timeouts
//   Status for any status other than 200 (including other 2xx codes)
pub async fn fetch_page(client: &Client, url: &str) -> Result<Page, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    info!(%url, "fetching page");

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let content_encoding = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    debug!(
        status = status.as_u16(),
        content_encoding = content_encoding.as_deref().unwrap_or("identity"),
        "response received"
    );

    Ok(Page {
        status,
        content_encoding,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{respond, serve_once};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_fetch_ok_streams_body() {
        let (url, request) = serve_once(respond("200 OK", &[], b"<a href=\"/x\">")).await;
        let client = build_client(DEFAULT_TIMEOUT).unwrap();

        let page = fetch_page(&client, &url).await.unwrap();
        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.content_encoding, None);

        let mut body = Vec::new();
        page.into_reader().read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"<a href=\"/x\">");

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get / http/1.1"));
        assert!(request.contains("user-agent: linktracker1.0.0"));
        assert!(request.contains("cache-control: no-cache"));
        assert!(request.contains("accept: text/html"));
        assert!(request.contains("accept-charset: utf8"));
        assert!(request.contains("accept-encoding: gzip"));
    }

    #[tokio::test]
    async fn test_non_200_is_rejected() {
        let (url, _request) = serve_once(respond("404 Not Found", &[], b"gone")).await;
        let client = build_client(DEFAULT_TIMEOUT).unwrap();

        let err = fetch_page(&client, &url).await.unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_other_success_codes_are_rejected() {
        let (url, _request) = serve_once(respond("201 Created", &[], b"created")).await;
        let client = build_client(DEFAULT_TIMEOUT).unwrap();

        let err = fetch_page(&client, &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status, .. } if status == StatusCode::CREATED));
    }

    #[tokio::test]
    async fn test_gzip_body_is_left_encoded() {
        let raw = b"\x1f\x8b not really gzip";
        let (url, _request) =
            serve_once(respond("200 OK", &[("Content-Encoding", "gzip")], raw)).await;
        let client = build_client(DEFAULT_TIMEOUT).unwrap();

        let page = fetch_page(&client, &url).await.unwrap();
        assert_eq!(page.content_encoding.as_deref(), Some("gzip"));

        let mut body = Vec::new();
        page.into_reader().read_to_end(&mut body).await.unwrap();
        assert_eq!(body, raw);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let err = fetch_page(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_request_error() {
        // Bind and drop to get a port nobody is listening on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = build_client(DEFAULT_TIMEOUT).unwrap();
        let err = fetch_page(&client, &format!("http://{}/", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
