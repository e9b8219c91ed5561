//! Parties of a signature request.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::events::{EventRegistry, SignerEvent, SignerEventKind};
use super::file::SignatureFile;
use super::status::ReceiverStatus;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Signer,
    Validator,
    Witness,
}

/// The person who sends the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requester {
    pub name: String,
    pub email: String,
}

impl Requester {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A signer, validator or witness.
///
/// `status` and `token` are owned by the server: they are only written when
/// reconciling a server response and are never sent back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    pub email: String,
    #[serde(rename = "type", default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    /// all, text, sign or image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_signature_type: Option<String>,
    #[serde(default)]
    pub files: Vec<SignatureFile>,
    #[serde(skip_serializing, default)]
    status: ReceiverStatus,
    #[serde(skip_serializing, default, alias = "token_signer")]
    token: Option<String>,
    #[serde(skip)]
    events: EventRegistry,
}

impl Receiver {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            phone: None,
            access_code: None,
            force_signature_type: None,
            files: Vec::new(),
            status: ReceiverStatus::default(),
            token: None,
            events: EventRegistry::default(),
        }
    }

    pub fn signer(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Role::Signer)
    }

    pub fn validator(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Role::Validator)
    }

    pub fn witness(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Role::Witness)
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_access_code(mut self, code: impl Into<String>) -> Self {
        self.access_code = Some(code.into());
        self
    }

    pub fn status(&self) -> ReceiverStatus {
        self.status
    }

    /// Server token of this receiver, known once the request was created.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub(crate) fn is(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }

    /// Attach a file; a file can be attached once per receiver.
    pub fn add_file(&mut self, file: SignatureFile) -> Result<&mut SignatureFile> {
        if self
            .files
            .iter()
            .any(|f| f.server_filename == file.server_filename)
        {
            return Err(Error::ElementAlreadyExists(format!(
                "file {} on receiver {}",
                file.server_filename, self.email
            )));
        }
        self.files.push(file);
        let last = self.files.len() - 1;
        Ok(&mut self.files[last])
    }

    pub fn remove_file(&mut self, server_filename: &str) -> Result<SignatureFile> {
        let index = self
            .files
            .iter()
            .position(|f| f.server_filename == server_filename)
            .ok_or_else(|| Error::FileNotFound(server_filename.to_string()))?;
        Ok(self.files.remove(index))
    }

    pub fn on<F>(&mut self, kind: SignerEventKind, handler: F)
    where
        F: Fn(&SignerEvent) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.events.on(kind, handler);
    }

    pub(crate) async fn emit(&self, kind: SignerEventKind, old: Option<String>, new: String) {
        self.events
            .emit(SignerEvent {
                kind,
                email: self.email.clone(),
                old,
                new,
            })
            .await;
    }

    /// Record a status reported by the server. Returns whether it changed;
    /// a change fires `StatusChanged` once every handler has completed.
    pub async fn apply_remote_status(&mut self, status: ReceiverStatus) -> bool {
        if self.status == status {
            return false;
        }
        let old = std::mem::replace(&mut self.status, status);
        tracing::debug!("Receiver {} status {} -> {}", self.email, old, status);
        self.emit(
            SignerEventKind::StatusChanged,
            Some(old.to_string()),
            status.to_string(),
        )
        .await;
        true
    }

    /// Copy for a new request: server state and handlers are not carried over.
    pub(crate) fn detached(&self) -> Self {
        Self {
            status: ReceiverStatus::default(),
            token: None,
            events: EventRegistry::default(),
            ..self.clone()
        }
    }
}
