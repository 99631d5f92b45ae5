#![cfg(test)]

use std::{
    collections::BTreeMap,
    convert::Infallible,
    future::Future,
    io,
    net::SocketAddr,
    pin::Pin,
    sync::{Arc, LazyLock, Mutex},
};

use http_body_util::{BodyExt, Full};
use hyper::{
    body::{self, Bytes},
    server::conn::http1,
    service::service_fn,
    Request, Response,
};
use hyper_util::rt::TokioIo;
use reqsession::SessionBuilder;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_rustls::{
    rustls::{
        self,
        pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer},
        ServerConfig,
    },
    TlsAcceptor,
};

mod fixtures;
mod request_ext;

pub use request_ext::RequestExt;

#[must_use]
struct HyperFixtureHandle(String);

impl Drop for HyperFixtureHandle {
    fn drop(&mut self) {
        let failed_request = {
            let mut services = HYPER_SERVICE_FIXTURES.lock().unwrap();
            services
                .remove(&*self.0)
                .expect("fixture not found")
                .assertion_failed_request
        };
        if let Some(req) = failed_request {
            panic!("assertion failed for request {}: {:?}", self.0, req);
        }
    }
}

type FixtureAssertionResult = (Response<Full<Bytes>>, Result<(), Request<body::Incoming>>);

type HyperServiceFixtureCallback = Box<
    dyn Fn(Request<body::Incoming>) -> Pin<Box<dyn Future<Output = FixtureAssertionResult> + Send>>
        + Send
        + Sync,
>;
struct HyperServiceFixture {
    svc: HyperServiceFixtureCallback,
    assertion_failed_request: Option<Request<body::Incoming>>,
}

static HYPER_SERVICE_FIXTURES: Mutex<BTreeMap<String, HyperServiceFixture>> =
    Mutex::new(BTreeMap::new());

fn add_hyper_fixture<Fut>(
    url: impl Into<String>,
    svc_fn: impl Fn(Request<body::Incoming>) -> Fut + Send + Sync + 'static,
) -> HyperFixtureHandle
where
    Fut: Future<Output = FixtureAssertionResult> + Send + 'static,
{
    let mut url: String = url.into();
    if !url.starts_with('/') {
        url.insert(0, '/');
    }
    let svc: HyperServiceFixtureCallback = Box::new(move |req| {
        let fut: Pin<Box<dyn Future<Output = FixtureAssertionResult> + Send>> =
            Box::pin(svc_fn(req));
        fut
    });
    let fixture = HyperServiceFixture {
        svc,
        assertion_failed_request: None,
    };
    {
        let url = url.clone();
        let mut services = HYPER_SERVICE_FIXTURES.lock().unwrap();
        services.insert(url, fixture);
    }
    HyperFixtureHandle(url)
}

async fn handle_service(req: Request<body::Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_owned();
    let fut = {
        let services = HYPER_SERVICE_FIXTURES.lock().unwrap();
        match services.get(&*path) {
            Some(fixture) => (fixture.svc)(req),
            None => {
                let mut res = Response::new(Full::new(Bytes::from_static(b"no fixture")));
                *res.status_mut() = hyper::StatusCode::NOT_FOUND;
                return Ok(res);
            }
        }
    };
    let (response, result) = fut.await;

    if let Err(req) = result {
        let mut services = HYPER_SERVICE_FIXTURES.lock().unwrap();
        if let Some(fixture) = services.get_mut(&*path) {
            fixture.assertion_failed_request = Some(req);
        }
    }

    Ok(response)
}

async fn setup_hyper_impl() -> Result<String, io::Error> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));

    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.expect("accept failed");
            let io = TokioIo::new(stream);

            tokio::task::spawn(async move {
                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, service_fn(handle_service))
                    .await
                {
                    eprintln!("Error serving connection: {err:?}");
                }
            });
        }
    });

    Ok(format!("http://127.0.0.1:{port}/"))
}

/// A server config presenting a self-signed certificate for `127.0.0.1` and `localhost`.
fn self_signed_tls_config() -> io::Result<ServerConfig> {
    let cert = CertificateDer::from(include_bytes!("../certs/self_signed.crt.der").to_vec());
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        include_bytes!("../certs/self_signed.key.der").to_vec(),
    ));
    ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .and_then(|builder| {
            builder
                .with_no_client_auth()
                .with_single_cert(vec![cert], key)
        })
        .map_err(io::Error::other)
}

async fn setup_hyper_tls_impl() -> Result<String, io::Error> {
    let acceptor = TlsAcceptor::from(Arc::new(self_signed_tls_config()?));
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));

    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.expect("accept failed");
            let acceptor = acceptor.clone();

            tokio::task::spawn(async move {
                // Clients rejecting the certificate abort the handshake here.
                let Ok(stream) = acceptor.accept(stream).await else {
                    return;
                };
                if let Err(err) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(handle_service))
                    .await
                {
                    eprintln!("Error serving TLS connection: {err:?}");
                }
            });
        }
    });

    Ok(format!("https://127.0.0.1:{port}/"))
}

static TOKIO_RT: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
});

fn base_url() -> io::Result<String> {
    use tokio::sync::OnceCell;

    static HYPER_SERVICE_INIT: OnceCell<io::Result<String>> = OnceCell::const_new();
    TOKIO_RT.block_on(async {
        match HYPER_SERVICE_INIT.get_or_init(setup_hyper_impl).await {
            Ok(url) => Ok(url.clone()),
            Err(err) => Err(io::Error::new(err.kind(), err.to_string())),
        }
    })
}

fn tls_base_url() -> io::Result<String> {
    use tokio::sync::OnceCell;

    static HYPER_TLS_SERVICE_INIT: OnceCell<io::Result<String>> = OnceCell::const_new();
    TOKIO_RT.block_on(async {
        match HYPER_TLS_SERVICE_INIT.get_or_init(setup_hyper_tls_impl).await {
            Ok(url) => Ok(url.clone()),
            Err(err) => Err(io::Error::new(err.kind(), err.to_string())),
        }
    })
}

/// A session builder pointed at the fixture server.
fn init_builder() -> io::Result<SessionBuilder> {
    Ok(reqsession::Session::builder()
        .base_url(base_url()?)
        .no_proxy())
}

/// A session builder pointed at the fixture server behind a self-signed certificate.
fn init_tls_builder() -> io::Result<SessionBuilder> {
    Ok(reqsession::Session::builder()
        .base_url(tls_base_url()?)
        .no_proxy())
}

/// Collects a request body and parses it as JSON.
async fn collect_json(req: Request<body::Incoming>) -> Value {
    let bytes = req.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn json_response(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(Full::new(body.into()))
        .unwrap()
}

/// Answers with the method, headers and JSON body of the request.
async fn echo_handler(req: Request<body::Incoming>) -> FixtureAssertionResult {
    let method = req.method().to_string();
    let headers: serde_json::Map<String, Value> = req
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_owned(),
                Value::from(v.to_str().unwrap_or_default()),
            )
        })
        .collect();
    let body = collect_json(req).await;
    let echo = serde_json::json!({
        "method": method,
        "headers": headers,
        "body": body,
    });
    (json_response(echo.to_string()), Ok(()))
}
