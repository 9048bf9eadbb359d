//! libcurl-backed fetcher.

use std::str;
use std::time::Duration;

use super::parse::parse_header_lines;
use super::{FetchError, FetchOptions, FetchRequest, FetchResult, Fetcher, Method, TlsPolicy};

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: u32 = 10;

/// Fetches with a fresh curl Easy handle per request. Blocking; safe to share
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    options: FetchOptions,
}

impl CurlFetcher {
    pub fn new(options: FetchOptions) -> Self {
        if options.tls == TlsPolicy::TrustAllHostnames {
            tracing::warn!("TLS hostname verification is disabled (legacy behavior)");
        }
        Self { options }
    }
}

/// A zero timeout means no limit. curl would read 0 as "use the built-in
/// connect default" or, for the low-speed window, abort after one second.
fn limit(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|d| !d.is_zero())
}

/// Only absolute http/https URLs are handed to curl.
fn check_url(raw: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(raw).map_err(|source| FetchError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        check_url(&request.url)?;

        let mut body: Vec<u8> = Vec::new();
        let mut header_lines: Vec<String> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        if self.options.tls == TlsPolicy::TrustAllHostnames {
            easy.ssl_verify_host(false)?;
        }

        if let Some(d) = limit(request.connect_timeout.or(self.options.connect_timeout)) {
            easy.connect_timeout(d)?;
        }
        // No bytes at all for `d` aborts the transfer.
        if let Some(d) = limit(request.read_timeout.or(self.options.read_timeout)) {
            easy.low_speed_limit(1)?;
            easy.low_speed_time(d.max(Duration::from_secs(1)))?;
        }

        let method = request.effective_method();
        match &request.body {
            Some(data) => {
                easy.post(true)?;
                easy.post_fields_copy(data.as_bytes())?;
            }
            None if method == Method::Post => {
                easy.post(true)?;
                easy.post_field_size(0)?;
            }
            None => {}
        }
        if matches!(method, Method::Put | Method::Delete) {
            easy.custom_request(method.as_str())?;
        }

        let mut list = curl::easy::List::new();
        for line in request.header_lines() {
            list.append(&line)?;
        }
        if !request.headers.is_empty() {
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        tracing::debug!(url = %request.url, status = code, bytes = body.len(), "fetched");
        Ok(FetchResult::new(code, parse_header_lines(&header_lines), body))
    }
}
