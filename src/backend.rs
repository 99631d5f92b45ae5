//! Transport interface used by [`Session`](crate::Session).
//!
//! A session never talks to the network directly. It turns each call into a [`RawRequest`] and
//! hands it to a [`Transport`], which must send it and read the whole response body before
//! returning. The default transport is built on reqwest, see [`ReqwestTransport`].

use std::fmt;

use crate::Method;

mod client;

pub use client::ReqwestTransport;

/// The body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    /// Encoded bytes, sent as is.
    Bytes(Vec<u8>),
    /// A multipart form. The matching `multipart/form-data` content type, boundary included, is
    /// already among the request headers.
    Multipart(reqwest::multipart::Form),
}

impl RequestBody {
    /// The encoded bytes, or `None` for a multipart form.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Bytes(bytes) => Some(bytes),
            RequestBody::Multipart(_) => None,
        }
    }
}

/// A fully materialized outgoing request.
#[derive(Debug)]
pub struct RawRequest {
    /// The request method.
    pub method: Method,
    /// The target URL, possibly relative to the transport's base URL.
    pub url: String,
    /// Headers in application order. A later entry replaces an earlier one with the same name.
    pub headers: Vec<(String, String)>,
    /// The request body.
    pub body: RequestBody,
}

/// A response whose body has been read in full.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// The status code. Sessions only log it.
    pub status: u16,
    /// The response body.
    pub body: Vec<u8>,
}

/// A blocking HTTP transport.
///
/// Implementations must be thread-safe, since a [`Session`](crate::Session) can be shared
/// between threads for concurrent requests.
pub trait Transport: Send + Sync + 'static {
    /// Provides a textual description of this transport.
    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    /// Sends the request and blocks until the whole response body is available or an error
    /// occurs.
    fn execute(&self, request: RawRequest) -> crate::Result<RawResponse>;
}
