//! HTTP fetch capability.
//!
//! `Fetcher` performs one request and returns the whole response in memory.
//! `CurlFetcher` is the libcurl-backed implementation used by the CLI; tests
//! substitute in-process fakes.

mod error;
mod http;
mod parse;

pub use error::FetchError;
pub use http::CurlFetcher;

use std::collections::BTreeMap;
use std::time::Duration;

/// Header name -> values. Multi-valued request headers are sent joined with `;`.
pub type HeaderMap = BTreeMap<String, Vec<String>>;

/// Request methods the fetcher knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Maps `GET`, `POST`, `PUT` or `DELETE` to a method; anything else
    /// (including `None` and lower-case spellings) falls back to `Get`.
    pub fn parse_lenient(method: Option<&str>) -> Self {
        match method {
            Some("GET") => Method::Get,
            Some("POST") => Method::Post,
            Some("PUT") => Method::Put,
            Some("DELETE") => Method::Delete,
            _ => Method::Get,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Headers sent when the caller supplies none.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Content-Type".to_string(),
        vec!["application/json".to_string(), "charset=utf-8".to_string()],
    );
    headers
}

/// One HTTP request. `None` timeouts fall back to the fetcher's own options.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub body: Option<String>,
    pub headers: HeaderMap,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

impl FetchRequest {
    /// GET with the default headers, no body, no timeouts.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
            headers: default_headers(),
            connect_timeout: None,
            read_timeout: None,
        }
    }

    /// Method actually sent: a GET carrying a body goes out as POST.
    pub fn effective_method(&self) -> Method {
        match (self.method, &self.body) {
            (Method::Get, Some(_)) => Method::Post,
            (m, _) => m,
        }
    }

    /// Header lines in `Name: v1;v2` form.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(name, values)| format!("{}: {}", name.trim(), values.join(";")))
            .collect()
    }
}

/// Response of one request. The body is populated for error statuses too.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// `status_code < 400`.
    pub success: bool,
    pub status_code: u32,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl FetchResult {
    pub fn new(status_code: u32, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            success: status_code < 400,
            status_code,
            headers,
            body,
        }
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// How HTTPS server identity is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Accept certificates whose hostname doesn't match the URL. Matches the
    /// legacy tool; insecure.
    #[default]
    TrustAllHostnames,
    /// Full certificate and hostname verification.
    Strict,
}

/// Transport options shared by every request a fetcher sends.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub tls: TlsPolicy,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
}

/// Performs a single HTTP request. Shared across worker threads.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        (**self).fetch(request)
    }
}
