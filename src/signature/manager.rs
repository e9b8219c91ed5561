//! Administrative calls on existing signature requests.
//!
//! These calls are keyed by the tokens returned when a request was created
//! and never touch a task's state machine.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::events::SignerEventKind;
use super::receiver::Receiver;
use super::status::ReceiverStatus;
use super::task::{SignatureResponse, SignatureTemplate};
use crate::error::{Error, Result};
use crate::task::{is_falsy_payload, TaskFactory, Tool};
use crate::transport::{HttpRequest, HttpResponse};

/// Page information from the `x-pagination-*` response headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: Option<u64>,
    pub page_count: Option<u64>,
    pub per_page: Option<u64>,
    pub total_count: Option<u64>,
}

impl Pagination {
    fn from_response(response: &HttpResponse) -> Self {
        let read = |name: &str| {
            response
                .header(&format!("x-pagination-{}", name))
                .and_then(|v| v.trim().parse().ok())
        };
        Self {
            current_page: read("current-page"),
            page_count: read("page-count"),
            per_page: read("per-page"),
            total_count: read("total-count"),
        }
    }

    pub fn has_next(&self) -> bool {
        matches!((self.current_page, self.page_count), (Some(c), Some(n)) if c < n)
    }
}

#[derive(Debug, Clone)]
pub struct SignatureList {
    pub items: Vec<SignatureResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<ReceiverStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct SignatureManager {
    factory: TaskFactory,
}

impl SignatureManager {
    pub fn new(factory: TaskFactory) -> Self {
        Self { factory }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/signature/{}", self.factory.config().base_url(), path)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.factory.auth().get_token().await?;
        tracing::debug!("{} {}", request.method, request.url);
        Ok(self.factory.transport().send(request.bearer(&token)).await?)
    }

    async fn fetch_binary(&self, path: String) -> Result<Bytes> {
        let response = self.send(HttpRequest::get(self.url(&path)).binary()).await?;
        if is_falsy_payload(&response.body) {
            return Err(Error::Download(format!("empty payload for signature/{}", path)));
        }
        Ok(response.body)
    }

    /// Current state of a request, as seen by its requester.
    pub async fn get_status(&self, token_requester: &str) -> Result<SignatureResponse> {
        let value = self
            .send(HttpRequest::get(self.url(&format!("requesterview/{}", token_requester))))
            .await?
            .json()?;
        Ok(serde_json::from_value(value)?)
    }

    /// One page of the account's signature requests. Pages start at 1.
    pub async fn list(&self, page: u32, per_page: u32) -> Result<SignatureList> {
        let url = format!(
            "{}?page={}&per-page={}",
            self.url("list"),
            page.max(1),
            per_page
        );
        let response = self.send(HttpRequest::get(url)).await?;
        let items = match response.json()? {
            Value::Null => Vec::new(),
            value => serde_json::from_value(value)?,
        };
        Ok(SignatureList {
            items,
            pagination: Pagination::from_response(&response),
        })
    }

    pub async fn void(&self, token_requester: &str) -> Result<()> {
        self.send(HttpRequest::put(self.url(&format!("void/{}", token_requester))))
            .await?;
        tracing::info!("Voided signature request {}", token_requester);
        Ok(())
    }

    pub async fn increase_expiration_days(&self, token_requester: &str, days: u32) -> Result<()> {
        let url = self.url(&format!("increase-expiration-days/{}", token_requester));
        self.send(HttpRequest::put(url).json(json!({ "days": days })))
            .await?;
        Ok(())
    }

    pub async fn send_reminders(&self, token_requester: &str) -> Result<()> {
        self.send(HttpRequest::post(
            self.url(&format!("sendReminders/{}", token_requester)),
        ))
        .await?;
        Ok(())
    }

    pub async fn download_original(&self, token_requester: &str) -> Result<Bytes> {
        self.fetch_binary(format!("{}/download-original", token_requester))
            .await
    }

    pub async fn download_signed(&self, token_requester: &str) -> Result<Bytes> {
        self.fetch_binary(format!("{}/download-signed", token_requester))
            .await
    }

    pub async fn download_audit(&self, token_requester: &str) -> Result<Bytes> {
        self.fetch_binary(format!("{}/download-audit", token_requester))
            .await
    }

    pub async fn get_receiver_info(&self, receiver_token: &str) -> Result<ReceiverInfo> {
        let value = self
            .send(HttpRequest::get(
                self.url(&format!("receiver/info/{}", receiver_token)),
            ))
            .await?
            .json()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Correct a receiver's e-mail. The local receiver changes only after
    /// the server accepted, then `EmailChanged` fires.
    pub async fn fix_receiver_email(&self, receiver: &mut Receiver, email: &str) -> Result<()> {
        let token = receiver_token(receiver)?;
        let url = self.url(&format!("signer/fix-email/{}", token));
        self.send(HttpRequest::put(url).json(json!({ "email": email })))
            .await?;

        let old = std::mem::replace(&mut receiver.email, email.to_string());
        receiver
            .emit(SignerEventKind::EmailChanged, Some(old), email.to_string())
            .await;
        Ok(())
    }

    /// Correct a receiver's phone number; fires `PhoneChanged`.
    pub async fn fix_receiver_phone(&self, receiver: &mut Receiver, phone: &str) -> Result<()> {
        let token = receiver_token(receiver)?;
        let url = self.url(&format!("signer/fix-phone/{}", token));
        self.send(HttpRequest::put(url).json(json!({ "phone": phone })))
            .await?;

        let old = receiver.phone.replace(phone.to_string());
        receiver
            .emit(SignerEventKind::PhoneChanged, old, phone.to_string())
            .await;
        Ok(())
    }

    pub async fn get_template(&self, template_id: &str) -> Result<SignatureTemplate> {
        let value = self
            .send(HttpRequest::get(self.url(&format!("template/{}", template_id))))
            .await?
            .json()?;
        SignatureTemplate::from_value(value)
    }
}

fn receiver_token(receiver: &Receiver) -> Result<String> {
    receiver
        .token()
        .map(str::to_string)
        .ok_or_else(|| Error::RequiredParameter {
            tool: Tool::Sign.to_string(),
            parameter: "receiver token".to_string(),
        })
}
