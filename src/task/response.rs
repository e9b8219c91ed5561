//! Typed responses for each task stage.
//!
//! The raw body is parsed explicitly, checked for the fields the stage
//! requires, and only then deserialized. A body that is not JSON, or lacks a
//! field, is reported as the stage's own error kind.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{missing_field, Error, Result};
use crate::transport::HttpResponse;

pub(crate) const START_FIELDS: &[&str] = &["server", "task"];
pub(crate) const UPLOAD_FIELDS: &[&str] = &["server_filename"];
pub(crate) const PROCESS_FIELDS: &[&str] = &[
    "download_filename",
    "filesize",
    "output_filesize",
    "output_filenumber",
    "output_extensions",
    "timer",
    "status",
];
pub(crate) const DELETE_FIELDS: &[&str] = &[
    "download_filename",
    "filesize",
    "output_filesize",
    "output_filenumber",
    "output_extensions",
    "timer",
    "status",
    "file_number",
    "process_start",
    "server",
    "status_message",
    "tool",
];
pub(crate) const CONNECT_FIELDS: &[&str] = &["task", "files"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub server: String,
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_files: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub server_filename: String,
}

/// Download metadata returned by `process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub download_filename: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub filesize: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub output_filesize: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub output_filenumber: u64,
    /// Usually a JSON-encoded array such as `["pdf"]`
    pub output_extensions: Value,
    pub timer: Value,
    pub status: String,
}

/// Task metadata returned by `delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub download_filename: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub filesize: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub output_filesize: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub output_filenumber: u64,
    pub output_extensions: Value,
    pub timer: Value,
    pub status: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub file_number: u64,
    pub process_start: String,
    pub server: String,
    pub status_message: String,
    pub tool: String,
}

/// New task handle and output files of the predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub task: String,
    /// `server_filename -> filename`, in server order
    pub files: serde_json::Map<String, Value>,
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid size '{}': {}", s, e))),
        other => Err(serde::de::Error::custom(format!("invalid size {}", other))),
    }
}

/// Check `fields` on `body`, then deserialize it into `T`.
pub(crate) fn parse_stage<T: DeserializeOwned>(
    body: &Value,
    fields: &[&str],
    stage_error: fn(String) -> Error,
) -> Result<T> {
    if let Some(field) = missing_field(body, fields) {
        return Err(stage_error(format!("response is missing '{}'", field)));
    }
    serde_json::from_value(body.clone())
        .map_err(|e| stage_error(format!("malformed response: {}", e)))
}

/// The JSON body of a stage response.
pub(crate) fn decode_body(
    response: &HttpResponse,
    stage_error: fn(String) -> Error,
) -> Result<Value> {
    response
        .json()
        .map_err(|e| stage_error(format!("response is not JSON: {}", e)))
}

/// [`decode_body`] followed by [`parse_stage`].
pub(crate) fn parse_reply<T: DeserializeOwned>(
    response: &HttpResponse,
    fields: &[&str],
    stage_error: fn(String) -> Error,
) -> Result<T> {
    let body = decode_body(response, stage_error)?;
    parse_stage(&body, fields, stage_error)
}

/// Payloads that carry no content and mean the download failed.
pub(crate) fn is_falsy_payload(body: &[u8]) -> bool {
    match std::str::from_utf8(body) {
        Ok(text) => matches!(text.trim(), "" | "false" | "null" | "undefined"),
        Err(_) => body.is_empty(),
    }
}
