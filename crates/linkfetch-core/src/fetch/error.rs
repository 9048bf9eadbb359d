//! Fetch error type.

/// Why a request produced no response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme {scheme:?} (only http and https)")]
    UnsupportedScheme { scheme: String },
    /// Curl reported an error (DNS, connect, TLS, timeout, malformed response).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
}

impl FetchError {
    /// True for curl timeouts (connect or low-speed read timeout).
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport(e) if e.is_operation_timedout())
    }
}
