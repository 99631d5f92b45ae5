//! A blocking HTTP client session with sticky headers and lazy JSON queries.
//!
//! ## Overview
//!
//! A [`Session`] keeps a set of headers (and, through the transport's cookie jar, session
//! cookies) that are attached to every request it sends. Each verb method serializes its payload
//! as a JSON body, sends it, reads the whole response and hands back a [`ResponseHandler`]. The
//! handler keeps the raw body around and only parses it when a field is asked for.
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! use reqsession::Session;
//! use serde_json::json;
//!
//! let mut session = Session::new(None, true)?;
//! session.add_header("Content-Type", "application/json");
//!
//! let login = session.post(
//!     "https://api.example.com/user/login",
//!     &json!({ "app_id": "id", "app_sec": "secret" }),
//! )?;
//! let token = login.find("data.access_token");
//! session.add_header("Authorization", format!("AppToken {}", token.str()));
//!
//! let presets = session.get("https://api.example.com/presets", &HashMap::<String, String>::new())?;
//! println!("{}", presets.json_format());
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration
//!
//! [`Session::new`] covers the common case of initial headers plus a TLS verification flag. For
//! everything else, start from [`Session::builder`]:
//!
//! ```no_run
//! let session = reqsession::Session::builder()
//!     .base_url("https://self-signed.internal/api/")
//!     .with_header("Accept", "application/json")
//!     .danger_accept_invalid_certs()
//!     .build()?;
//! let res = session.get("health", &serde_json::json!({}))?;
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! Serialization, request construction, transport and body-read failures are returned as
//! [`Error`]. A response is never rejected because of its status code. Callers preferring the
//! lenient "empty body on failure" behavior can write `.unwrap_or_default()`.
//!
//! Malformed JSON bodies never produce errors: [`ResponseHandler::find`] yields an absent
//! [`JsonResult`] and [`ResponseHandler::json_format`] yields `{}`.
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(missing_docs)]

pub mod backend;
mod body;
mod error;
pub mod json;
mod request;
mod response;
pub mod session;

pub use backend::{RawRequest, RawResponse, RequestBody, Transport};
pub use error::{BuildSessionError, BuildSessionResult, Error, Result};
pub use json::{JsonKind, JsonResult};
pub use request::Method;
pub use response::ResponseHandler;
#[doc(inline)]
pub use session::{Session, SessionBuilder, SessionOptions};
