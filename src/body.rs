use std::fs;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";
pub(crate) const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Encodes a request payload as a JSON body. A payload serializing to `null` is sent as `{}`.
pub(crate) fn encode_json<T: Serialize + ?Sized>(data: &T) -> serde_json::Result<Vec<u8>> {
    match serde_json::to_value(data)? {
        Value::Null => Ok(b"{}".to_vec()),
        value => serde_json::to_vec(&value),
    }
}

/// Reads the file at `file_path` into a multipart form, returning the form with its content type.
///
/// The file becomes the part named `field`, followed by one text part per entry in `data`. Part
/// names are sent verbatim.
pub(crate) fn encode_multipart<I, K, V>(
    field: &str,
    file_path: &Path,
    data: I,
) -> Result<(String, Form)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let content = fs::read(file_path)?;
    let filename = file_path
        .file_name()
        .unwrap_or(file_path.as_os_str())
        .to_string_lossy()
        .into_owned();
    let file = Part::bytes(content)
        .file_name(filename)
        .mime_str(FILE_CONTENT_TYPE)?;

    let form = data.into_iter().fold(
        Form::new()
            .percent_encode_noop()
            .part(field.to_owned(), file),
        |form, (k, v)| form.text(k.as_ref().to_owned(), v.as_ref().to_owned()),
    );
    let content_type = format!("multipart/form-data; boundary={}", form.boundary());
    Ok((content_type, form))
}
