//! Error taxonomy for the client.
//!
//! Every structural failure has its own variant so callers can match on the
//! stage that failed instead of parsing messages. Transport failures are
//! wrapped unchanged in [`Error::Transport`].

use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Start error: {0}")]
    Start(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Delete error: {0}")]
    Delete(String),

    #[error("Connect error: {0}")]
    Connect(String),

    #[error("Missing required parameter '{parameter}' for tool '{tool}'")]
    RequiredParameter { tool: String, parameter: String },

    #[error("Tool not supported: {0}")]
    ToolNotSupported(String),

    #[error("Element already exists: {0}")]
    ElementAlreadyExists(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Signer already exists: {0}")]
    SignerAlreadyExists(String),

    #[error("Signer not found: {0}")]
    SignerNotFound(String),

    #[error("File not found in task: {0}")]
    FileNotFound(String),

    #[error("Invalid file encryption key: length {length}, expected 14, 16 or 32 characters")]
    FileEncryptionKey { length: usize },

    #[error("Task has not been started")]
    TaskNotStarted,

    #[error("Cannot {operation} a task in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Invalid file source: {0}")]
    InvalidSource(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Return the first of `fields` that is absent (or null) in `value`.
pub(crate) fn missing_field<'a>(value: &serde_json::Value, fields: &[&'a str]) -> Option<&'a str> {
    fields
        .iter()
        .copied()
        .find(|f| value.get(*f).map_or(true, |v| v.is_null()))
}
