//! Configuration options for sessions.

/// Configuration options for creating a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Optional base URL that relative request URLs are joined onto.
    pub base_url: Option<String>,
    /// Optional User-Agent header value used by the transport.
    pub user_agent: Option<String>,
    /// Initial contents of the session header map.
    pub default_headers: Vec<(String, String)>,
    /// Whether TLS certificates are verified.
    pub verify: bool,
    /// Whether the transport keeps a cookie jar and replays cookies it receives.
    pub use_cookies: bool,
    /// Whether to use the system's default proxy settings.
    pub use_default_proxy: bool,
    /// Optional maximum size of a response body.
    pub max_response_buffer_size: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            default_headers: vec![],
            verify: true,
            use_cookies: true,
            use_default_proxy: true,
            max_response_buffer_size: None,
        }
    }
}
