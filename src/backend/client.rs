use std::future::Future;
use std::io;
use std::sync::OnceLock;
use std::thread;

use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::{RawRequest, RawResponse, RequestBody, Transport};
use crate::error::{BuildSessionError, BuildSessionResult, Error, Result};
use crate::session::SessionOptions;

/// The default transport, backed by an async [`reqwest::Client`].
///
/// Requests are driven to completion on a private current-thread runtime, created on first use
/// and reused afterwards. Outside of a tokio runtime it runs on the caller's thread. Inside one
/// it runs on a short-lived helper thread while the caller blocks.
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<Url>,
    max_response_buffer_size: Option<u64>,
    managed_runtime: OnceLock<Runtime>,
}

impl ReqwestTransport {
    /// Builds a transport from session options.
    pub fn new(options: &SessionOptions) -> BuildSessionResult<Self> {
        let base_url = match &options.base_url {
            Some(base_url) => Some(
                Url::parse(base_url)
                    .map_err(|_| BuildSessionError::InvalidBaseUrl(base_url.clone()))?,
            ),
            None => None,
        };
        Ok(Self {
            client: build_reqwest_client(options)?,
            base_url,
            max_response_buffer_size: options.max_response_buffer_size,
            managed_runtime: OnceLock::new(),
        })
    }

    async fn send(&self, request: RawRequest) -> Result<RawResponse> {
        let url = build_url(self.base_url.as_ref(), &request.url)?;
        let headers = convert_headers(request.headers)?;
        let builder = self.client.request(request.method.into(), url);
        let builder = match request.body {
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Multipart(form) => builder.multipart(form),
        };
        // Session headers go last so they replace the content type `multipart` sets.
        let response = builder.headers(headers).send().await?;
        let status = response.status().as_u16();
        let body = collect_all_bytes(response, self.max_response_buffer_size).await?;
        Ok(RawResponse { status, body })
    }

    fn managed_runtime(&self) -> io::Result<&Runtime> {
        if let Some(runtime) = self.managed_runtime.get() {
            return Ok(runtime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        // Losing a race here drops our runtime and keeps the winner's.
        let _ = self.managed_runtime.set(runtime);
        self.managed_runtime
            .get()
            .ok_or_else(|| io::Error::other("managed runtime unavailable"))
    }

    /// Runs `task` to completion from synchronous code, whatever the calling context is.
    ///
    /// Every request runs on the managed runtime, since pooled connections are bound to the
    /// runtime that opened them.
    fn block_on<F, Fut, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>>,
        T: Send,
    {
        let runtime = self.managed_runtime()?;
        let Ok(handle) = Handle::try_current() else {
            return runtime.block_on(task());
        };
        // A thread inside a runtime cannot block on another one, so park on a helper thread.
        let run_on_helper = || {
            thread::scope(|s| match s.spawn(|| runtime.block_on(task())).join() {
                Ok(res) => res,
                Err(panic) => std::panic::resume_unwind(panic),
            })
        };
        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => tokio::task::block_in_place(run_on_helper),
            _ => run_on_helper(),
        }
    }
}

impl Drop for ReqwestTransport {
    fn drop(&mut self) {
        // Dropping a runtime from async code panics, shutting it down in the background does not.
        if let Some(runtime) = self.managed_runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Transport for ReqwestTransport {
    fn describe(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.base_url {
            Some(base_url) => write!(f, "ReqwestTransport({base_url})"),
            None => write!(f, "ReqwestTransport"),
        }
    }

    fn execute(&self, request: RawRequest) -> Result<RawResponse> {
        self.block_on(|| self.send(request))
    }
}

fn build_reqwest_client(options: &SessionOptions) -> BuildSessionResult<Client> {
    let mut builder = Client::builder();

    if let Some(user_agent) = &options.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if !options.use_default_proxy {
        builder = builder.no_proxy();
    }
    if !options.verify {
        tracing::warn!("TLS certificate verification is disabled for this session");
    }

    builder
        .cookie_store(options.use_cookies)
        .danger_accept_invalid_certs(!options.verify)
        .build()
        .map_err(BuildSessionError::Transport)
}

pub(crate) fn build_url(base_url: Option<&Url>, url: &str) -> Result<Url> {
    match base_url {
        Some(base) => base.join(url),
        None => Url::parse(url),
    }
    .map_err(|_| Error::InvalidUrl(url.to_string()))
}

fn convert_headers(headers: Vec<(String, String)>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| Error::InvalidHeaderName(key.clone()))?;
        let value =
            HeaderValue::from_str(&value).map_err(|_| Error::InvalidHeaderValue(key.clone()))?;
        map.insert(name, value);
    }
    Ok(map)
}

async fn collect_all_bytes(
    mut response: reqwest::Response,
    max_response_buffer_size: Option<u64>,
) -> Result<Vec<u8>> {
    if let (Some(max), Some(len)) = (max_response_buffer_size, response.content_length()) {
        if len > max {
            return Err(Error::ResponseTooLarge);
        }
    }
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if max_response_buffer_size.is_some_and(|max| (buf.len() + chunk.len()) as u64 > max) {
            return Err(Error::ResponseTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
