use hyper::{body, Request};

pub trait RequestExt {
    /// The value of `name`, or `""` when missing or not valid UTF-8.
    fn header_str(&self, name: &str) -> &str;
}

impl RequestExt for Request<body::Incoming> {
    fn header_str(&self, name: &str) -> &str {
        self.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}
