//! Scripted transport for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError};

struct Expectation {
    method: Method,
    path: String,
    response: Result<HttpResponse, TransportError>,
}

/// Replays queued responses for requests whose URL ends with the expected
/// path (query strings ignored) and records every request it sees.
#[derive(Default)]
pub(crate) struct MockTransport {
    expectations: Mutex<Vec<Expectation>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: Method, path: &str, response: HttpResponse) -> &Self {
        self.expectations.lock().unwrap().push(Expectation {
            method,
            path: path.to_string(),
            response: Ok(response),
        });
        self
    }

    pub fn on_json(&self, method: Method, path: &str, body: Value) -> &Self {
        self.on(method, path, HttpResponse::new(200, body.to_string()))
    }

    pub fn on_error(&self, method: Method, path: &str, error: TransportError) -> &Self {
        self.expectations.lock().unwrap().push(Expectation {
            method,
            path: path.to_string(),
            response: Err(error),
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// JSON body of the last request sent to `path`.
    pub fn last_json(&self, path: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| strip_query(&r.url).ends_with(path))
            .and_then(|r| match &r.body {
                RequestBody::Json(v) => Some(v.clone()),
                _ => None,
            })
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = strip_query(&request.url).to_string();
        let method = request.method;
        self.requests.lock().unwrap().push(request);

        let mut expectations = self.expectations.lock().unwrap();
        let pos = expectations
            .iter()
            .position(|e| e.method == method && url.ends_with(&e.path))
            .ok_or_else(|| TransportError::Request(format!("no mock for {} {}", method, url)))?;
        expectations.remove(pos).response
    }
}
