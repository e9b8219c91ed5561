//! Files attached to a task.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Page rotation applied by tools that honour per-file `rotate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Clockwise90,
    Rotate180,
    Clockwise270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }
}

/// Per-file parameters. Sent with the file list at process time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<u16>,
    /// Password needed to open the file (unlock and friends)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A file the remote service knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFile {
    /// Name assigned by the service; the only identifier it recognises.
    pub server_filename: String,
    /// Original name, used for the output filename.
    pub filename: String,
    pub params: FileParams,
}

impl TaskFile {
    pub fn new(server_filename: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            server_filename: server_filename.into(),
            filename: filename.into(),
            params: FileParams::default(),
        }
    }

    pub fn set_rotation(&mut self, rotation: Rotation) -> &mut Self {
        self.params.rotate = Some(rotation.degrees());
        self
    }

    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.params.password = Some(password.into());
        self
    }

    /// Extra per-file key; `server_filename` and `filename` cannot be replaced.
    pub fn set_param(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.params.extra.insert(key.into(), value);
        self
    }

    /// Entry of the `files` array in process requests.
    pub fn to_json(&self) -> Value {
        let mut entry = Map::new();
        entry.insert(
            "server_filename".to_string(),
            Value::String(self.server_filename.clone()),
        );
        entry.insert("filename".to_string(), Value::String(self.filename.clone()));
        if let Ok(Value::Object(params)) = serde_json::to_value(&self.params) {
            for (key, value) in params {
                if entry.contains_key(&key) {
                    tracing::warn!(
                        "Ignoring file parameter '{}' on {}",
                        key,
                        self.server_filename
                    );
                    continue;
                }
                entry.insert(key, value);
            }
        }
        Value::Object(entry)
    }
}

/// Where an uploaded file comes from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Public URL fetched by the service itself.
    Url(String),
    /// Local file read before upload.
    Path(PathBuf),
    /// In-memory content.
    Bytes { filename: String, data: Bytes },
}

/// A source resolved to what the upload request needs.
pub(crate) enum UploadPayload {
    Cloud { url: String, filename: String },
    Content { filename: String, data: Bytes },
}

impl FileSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    pub fn bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Interpret a command-line style argument: URLs stay remote, anything
    /// else is a local path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::url(arg)
        } else {
            Self::path(arg)
        }
    }

    pub(crate) async fn resolve(self) -> Result<UploadPayload> {
        match self {
            Self::Url(raw) => {
                let parsed = url::Url::parse(&raw)
                    .map_err(|e| Error::InvalidSource(format!("{}: {}", raw, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(Error::InvalidSource(format!(
                        "unsupported URL scheme '{}'",
                        parsed.scheme()
                    )));
                }
                let filename = parsed
                    .path_segments()
                    .and_then(|segments| segments.last())
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        urlencoding::decode(s)
                            .map(|d| d.into_owned())
                            .unwrap_or_else(|_| s.to_string())
                    })
                    .unwrap_or_else(|| "file".to_string());
                Ok(UploadPayload::Cloud {
                    url: raw,
                    filename,
                })
            }
            Self::Path(path) => {
                let filename = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.to_string())
                    .ok_or_else(|| {
                        Error::InvalidSource(format!("no file name in {}", path.display()))
                    })?;
                let data = tokio::fs::read(&path).await?;
                Ok(UploadPayload::Content {
                    filename,
                    data: Bytes::from(data),
                })
            }
            Self::Bytes { filename, data } => {
                if filename.is_empty() {
                    return Err(Error::InvalidSource("empty file name".to_string()));
                }
                Ok(UploadPayload::Content { filename, data })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_file_json_includes_params() {
        let mut file = TaskFile::new("srv1.pdf", "input.pdf");
        file.set_rotation(Rotation::Clockwise90)
            .set_password("secret")
            .set_param("ranges", json!("1-2"));
        assert_eq!(
            file.to_json(),
            json!({
                "server_filename": "srv1.pdf",
                "filename": "input.pdf",
                "rotate": 90,
                "password": "secret",
                "ranges": "1-2"
            })
        );
        assert_eq!(
            TaskFile::new("a", "b").to_json(),
            json!({"server_filename": "a", "filename": "b"})
        );
    }

    #[test]
    fn test_params_cannot_replace_identity() {
        let mut file = TaskFile::new("srv1.pdf", "input.pdf");
        file.set_param("server_filename", json!("other.pdf"))
            .set_param("filename", json!("renamed.pdf"))
            .set_param("rotate", json!(180));
        assert_eq!(
            file.to_json(),
            json!({"server_filename": "srv1.pdf", "filename": "input.pdf", "rotate": 180})
        );
    }

    #[test]
    fn test_from_arg() {
        assert!(matches!(FileSource::from_arg("https://x.io/a.pdf"), FileSource::Url(_)));
        assert!(matches!(FileSource::from_arg("./a.pdf"), FileSource::Path(_)));
    }

    #[tokio::test]
    async fn test_resolve_url_takes_last_segment() {
        let payload = FileSource::url("https://files.example.com/docs/my%20file.pdf?x=1")
            .resolve()
            .await
            .unwrap();
        match payload {
            UploadPayload::Cloud { filename, .. } => assert_eq!(filename, "my file.pdf"),
            _ => panic!("expected cloud payload"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_urls() {
        for raw in ["not a url", "ftp://example.com/a.pdf"] {
            assert!(matches!(
                FileSource::url(raw).resolve().await,
                Err(Error::InvalidSource(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_resolve_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7")
            .unwrap();

        match FileSource::path(&path).resolve().await.unwrap() {
            UploadPayload::Content { filename, data } => {
                assert_eq!(filename, "doc.pdf");
                assert_eq!(data.as_ref(), b"%PDF-1.7");
            }
            _ => panic!("expected content payload"),
        }
    }
}
