//! Conditional HTTP fetching.
//!
//! Provides a blocking HTTP client that revalidates a cached copy with
//! `If-None-Match` / `If-Modified-Since` and hands back either "not
//! modified" or a streaming body.

use reqwest::blocking::{Client, Request, Response};
use reqwest::header::{
    HeaderValue, ACCEPT_ENCODING, CONTENT_LENGTH, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use reqwest::StatusCode;
use std::io::Write;
use std::time::Duration;

use crate::cache::Validators;
use crate::error::{CacheError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fetches URLs over HTTP/HTTPS with conditional requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

/// Outcome of a conditional fetch.
#[derive(Debug)]
pub enum FetchResult {
    /// 304: the stored copy is current.
    NotModified,
    /// 200: a new body is available.
    Modified(FetchResponse),
}

/// A 200 response whose body has not been read yet.
#[derive(Debug)]
pub struct FetchResponse {
    response: Response,
    /// ETag header if present.
    pub etag: Option<String>,
    /// Last-Modified header if present.
    pub last_modified: Option<String>,
}

impl FetchResponse {
    fn new(response: Response) -> Self {
        let etag = header_text(&response, ETAG);
        let last_modified = header_text(&response, LAST_MODIFIED);
        Self {
            response,
            etag,
            last_modified,
        }
    }

    /// Declared body length, if the server sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Stream the body into `writer`, returning the number of bytes copied.
    pub fn copy_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> reqwest::Result<u64> {
        self.response.copy_to(writer)
    }
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default 30-second timeout.
    pub fn new() -> Result<Self> {
        Self::with_settings(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP fetcher with custom timeout and user agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::RequestConstruction {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the conditional GET for `url`.
    ///
    /// Transport compression is always disabled: some origins compute the
    /// ETag over the compressed representation, which breaks revalidation.
    pub fn build_request(&self, url: &str, validators: &Validators) -> Result<Request> {
        let parsed = reqwest::Url::parse(url).map_err(|e| CacheError::RequestConstruction {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut request = self
            .client
            .get(parsed)
            .header(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        if let Some(etag) = validators.etag.as_deref().and_then(header_value) {
            tracing::debug!("Existing ETag: {:?}", etag);
            request = request.header(IF_NONE_MATCH, etag);
        }

        if let Some(since) = validators.last_modified.as_deref().and_then(header_value) {
            tracing::debug!("Existing Last-Modified: {:?}", since);
            request = request.header(IF_MODIFIED_SINCE, since);
        }

        request.build().map_err(|e| CacheError::RequestConstruction {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch with conditional request.
    ///
    /// Returns [`FetchResult::NotModified`] on 304. Any status other than
    /// 200 or 304 is an [`CacheError::UnexpectedStatus`].
    pub fn fetch_if_changed(&self, url: &str, validators: &Validators) -> Result<FetchResult> {
        let request = self.build_request(url, validators)?;

        tracing::debug!("GET {}", url);
        let response = self.client.execute(request).map_err(|e| {
            if e.is_builder() {
                CacheError::RequestConstruction {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            } else {
                CacheError::Network {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        tracing::debug!(
            "Response: {} (len: {})",
            status,
            header_text(&response, CONTENT_LENGTH).unwrap_or_else(|| "-".to_string())
        );

        match status {
            StatusCode::NOT_MODIFIED => Ok(FetchResult::NotModified),
            StatusCode::OK => Ok(FetchResult::Modified(FetchResponse::new(response))),
            status => Err(CacheError::UnexpectedStatus {
                url: url.to_string(),
                status,
            }),
        }
    }
}

fn header_text(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// A stored validator as a header value; values that can't be sent are dropped.
fn header_value(value: &str) -> Option<HeaderValue> {
    let parsed = HeaderValue::from_str(value).ok();
    if parsed.is_none() {
        tracing::debug!("Ignoring stored validator that is not a valid header: {:?}", value);
    }
    parsed
}
