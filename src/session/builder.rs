use std::collections::HashMap;

use super::{Session, SessionOptions};
use crate::backend::{ReqwestTransport, Transport};
use crate::error::BuildSessionResult;

/// A builder for [`Session`] with named configuration.
///
/// TLS certificates are verified unless [`danger_accept_invalid_certs`] or `verify(false)` is
/// called.
///
/// [`danger_accept_invalid_certs`]: SessionBuilder::danger_accept_invalid_certs
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SessionBuilder {
    pub(crate) options: SessionOptions,
}

impl SessionBuilder {
    /// Sets a base URL that relative request URLs are joined onto.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    /// Sets the User-Agent sent with every request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a header to the initial header map, replacing one whose name differs only in case.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .default_headers
            .push((key.into(), value.into()));
        self
    }

    /// Adds several headers to the initial header map.
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.options
            .default_headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets whether TLS certificates are verified.
    pub fn verify(mut self, verify: bool) -> Self {
        self.options.verify = verify;
        self
    }

    /// Accepts any TLS certificate, including self-signed and expired ones.
    pub fn danger_accept_invalid_certs(self) -> Self {
        self.verify(false)
    }

    /// Disables the cookie jar.
    pub fn no_cookies(mut self) -> Self {
        self.options.use_cookies = false;
        self
    }

    /// Ignores the system proxy settings.
    pub fn no_proxy(mut self) -> Self {
        self.options.use_default_proxy = false;
        self
    }

    /// Fails requests whose response body exceeds `size` bytes.
    pub fn max_response_buffer_size(mut self, size: u64) -> Self {
        self.options.max_response_buffer_size = Some(size);
        self
    }

    /// The options collected so far.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Builds a session backed by the default reqwest transport.
    pub fn build(self) -> BuildSessionResult<Session> {
        let transport = ReqwestTransport::new(&self.options)?;
        Ok(self.build_with_transport(transport))
    }

    /// Builds a session sending requests through `transport`.
    ///
    /// Only the header and verification options apply; everything else is up to the transport.
    pub fn build_with_transport(self, transport: impl Transport) -> Session {
        let mut headers = HashMap::with_capacity(self.options.default_headers.len());
        for (key, value) in self.options.default_headers {
            super::insert_header(&mut headers, key, value);
        }
        Session {
            headers,
            verify: self.options.verify,
            transport: Box::new(transport),
        }
    }
}
