//! The HTTP session and its configuration.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::path::Path;

use serde::Serialize;

use crate::backend::{RawRequest, RequestBody, Transport};
use crate::body::{self, JSON_CONTENT_TYPE};
use crate::error::{BuildSessionResult, Result};
use crate::{Method, ResponseHandler};

mod builder;
mod options;

pub use builder::SessionBuilder;
pub use options::SessionOptions;

const CONTENT_TYPE: &str = "Content-Type";

/// A blocking HTTP session carrying the same headers across requests.
///
/// Every request serializes its payload to a JSON body, attaches all session headers, and blocks
/// until the whole response body has been read. The response is returned as a
/// [`ResponseHandler`] no matter what its status code is.
///
/// # Thread safety
///
/// Request methods take `&self` and may run concurrently from several threads. Changing the
/// headers takes `&mut self`, so a session shared between threads that also needs new headers
/// must be wrapped in a lock.
pub struct Session {
    pub(crate) headers: HashMap<String, String>,
    pub(crate) verify: bool,
    pub(crate) transport: Box<dyn Transport>,
}

impl Session {
    /// Creates a session with initial `headers` and the given TLS verification policy.
    ///
    /// With `verify` set to `false` the session accepts any certificate, which is only meant for
    /// endpoints with self-signed or otherwise untrusted certificates.
    pub fn new(headers: Option<HashMap<String, String>>, verify: bool) -> BuildSessionResult<Self> {
        Self::builder()
            .with_headers(headers.unwrap_or_default())
            .verify(verify)
            .build()
    }

    /// Creates a session sending requests through a custom transport.
    pub fn with_transport(
        headers: Option<HashMap<String, String>>,
        verify: bool,
        transport: impl Transport,
    ) -> Self {
        Self::builder()
            .with_headers(headers.unwrap_or_default())
            .verify(verify)
            .build_with_transport(transport)
    }

    /// Starts building a session with named configuration.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Inserts or replaces a header sent with every subsequent request.
    ///
    /// Header names are case-insensitive, so an existing entry whose name differs only in case
    /// is replaced too.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        insert_header(&mut self.headers, key.into(), value.into());
    }

    /// The headers sent with every request.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Whether TLS certificates are verified.
    pub fn verify(&self) -> bool {
        self.verify
    }

    /// Sends a `GET` request with `params` as its JSON body.
    pub fn get<T: Serialize + ?Sized>(&self, url: &str, params: &T) -> Result<ResponseHandler> {
        self.request(Method::Get, url, params)
    }

    /// Sends a `POST` request with `data` as its JSON body.
    pub fn post<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<ResponseHandler> {
        self.request(Method::Post, url, data)
    }

    /// Sends a `PUT` request with `data` as its JSON body.
    pub fn put<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<ResponseHandler> {
        self.request(Method::Put, url, data)
    }

    /// Sends a `PATCH` request with `data` as its JSON body.
    pub fn patch<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<ResponseHandler> {
        self.request(Method::Patch, url, data)
    }

    /// Sends a `DELETE` request with `data` as its JSON body.
    pub fn delete<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> Result<ResponseHandler> {
        self.request(Method::Delete, url, data)
    }

    /// Sends a request with `data` serialized as its JSON body.
    ///
    /// A payload serializing to `null`, such as `None` or `()`, is sent as `{}`.
    pub fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        data: &T,
    ) -> Result<ResponseHandler> {
        let body = body::encode_json(data)?;
        self.send(method, url, RequestBody::Bytes(body), &[])
    }

    /// Uploads the file at `file_path` as a `multipart/form-data` `POST`.
    ///
    /// The file becomes the part named `field`, with the file name taken from the last component
    /// of the path. Every pair in `data` is added as a text field.
    ///
    /// **Note**: the generated `multipart/form-data; boundary=...` content type is stored in the
    /// session headers, replacing any `Content-Type` there. Later requests keep sending it until
    /// it is reset with [`add_header`](Self::add_header). Use
    /// [`upload_file_scoped`](Self::upload_file_scoped) to leave the headers alone.
    pub fn upload_file<I, K, V>(
        &mut self,
        url: &str,
        field: &str,
        file_path: impl AsRef<Path>,
        data: I,
    ) -> Result<ResponseHandler>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (content_type, form) = body::encode_multipart(field, file_path.as_ref(), data)?;
        tracing::debug!(%content_type, "upload replaces the session content type");
        insert_header(&mut self.headers, CONTENT_TYPE.to_owned(), content_type);
        self.send(Method::Post, url, RequestBody::Multipart(form), &[])
    }

    /// Same as [`upload_file`](Self::upload_file), except that the multipart content type only
    /// applies to this request.
    pub fn upload_file_scoped<I, K, V>(
        &self,
        url: &str,
        field: &str,
        file_path: impl AsRef<Path>,
        data: I,
    ) -> Result<ResponseHandler>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (content_type, form) = body::encode_multipart(field, file_path.as_ref(), data)?;
        self.send(
            Method::Post,
            url,
            RequestBody::Multipart(form),
            &[(CONTENT_TYPE, content_type.as_str())],
        )
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
        overrides: &[(&str, &str)],
    ) -> Result<ResponseHandler> {
        let mut headers = Vec::with_capacity(self.headers.len() + overrides.len() + 1);
        headers.push((CONTENT_TYPE.to_owned(), JSON_CONTENT_TYPE.to_owned()));
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        headers.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        tracing::debug!(
            %method,
            url,
            body_len = body.as_bytes().map(<[u8]>::len),
            multipart = matches!(body, RequestBody::Multipart(_)),
            "sending request"
        );
        let response = self.transport.execute(RawRequest {
            method,
            url: url.to_owned(),
            headers,
            body,
        })?;
        tracing::debug!(
            %method,
            url,
            status = response.status,
            body_len = response.body.len(),
            "received response"
        );
        Ok(ResponseHandler::from_bytes(response.body))
    }
}

/// Inserts a header, dropping any entry whose name matches `key` case-insensitively.
pub(crate) fn insert_header(headers: &mut HashMap<String, String>, key: String, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
    headers.insert(key, value);
}

struct DescribeTransport<'a>(&'a dyn Transport);

impl Debug for DescribeTransport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.describe(f)
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("headers", &self.headers)
            .field("verify", &self.verify)
            .field("transport", &DescribeTransport(&*self.transport))
            .finish()
    }
}
