use std::io;

use thiserror::Error;

/// The errors produced while sending a request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The URL could not be parsed, or could not be joined onto the configured base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// A session header name is not a valid HTTP header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),
    /// A session header value is not a valid HTTP header value.
    #[error("invalid header value for {0}")]
    InvalidHeaderValue(String),
    /// The request payload could not be serialized as JSON.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading the file to upload failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The transport failed to send the request or to read the response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body exceeds the limit set by
    /// [`crate::SessionBuilder::max_response_buffer_size`].
    #[error("response body size exceeds max limit")]
    ResponseTooLarge,
    /// A custom transport failed.
    #[error("transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A `Result` alias where the `Err` case is [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The errors produced when building a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildSessionError {
    /// The base URL is not an absolute URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// The transport could not be created from the options.
    #[error("error creating transport: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A `Result` alias where the `Err` case is [`BuildSessionError`].
pub type BuildSessionResult<T> = std::result::Result<T, BuildSessionError>;
