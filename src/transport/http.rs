//! `reqwest`-backed transport.

use async_trait::async_trait;
use reqwest::Client;

use super::{HttpRequest, HttpResponse, Method, RequestBody, ResponseMode, Transport, TransportError};

const BODY_PREVIEW_LIMIT: usize = 512;

/// Default transport using a shared `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Use a preconfigured client (timeouts, proxies, TLS settings).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            mode,
        } = request;

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| TransportError::Request(format!("Failed to encode body: {}", e)))?;
                builder.body(bytes)
            }
            RequestBody::Multipart(form) => {
                let mut multipart = reqwest::multipart::Form::new();
                for (name, value) in form.fields {
                    multipart = multipart.text(name, value);
                }
                if let Some(file) = form.file {
                    let part = reqwest::multipart::Part::bytes(file.data.to_vec())
                        .file_name(file.filename);
                    multipart = multipart.part(file.field, part);
                }
                builder.multipart(multipart)
            }
        };

        tracing::debug!("{} {} (mode={:?})", method, url, mode);

        let response = builder.send().await.map_err(Self::classify)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(Self::classify)?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: preview_body(&text),
            });
        }

        if mode == ResponseMode::Binary {
            tracing::debug!("Received {} bytes from {}", body.len(), url);
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.chars().count() <= BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    out.push_str("...");
    out
}
