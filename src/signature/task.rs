//! Signature requests built on a `sign` task.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::receiver::{Receiver, Requester};
use super::status::{ReceiverStatus, SignatureStatus};
use crate::error::{Error, Result};
use crate::task::{
    decode_body, parse_stage, AnyTask, DeleteResponse, FileParams, FileSource, Operation,
    StartResponse, Task, TaskFile, Tool,
};
use crate::transport::HttpRequest;

const SIGNATURE_FIELDS: &[&str] = &["token_requester", "signers"];

/// Keys the task owns in signature request bodies.
const RESERVED_KEYS: [&str; 4] = ["task", "files", "signers", "requester"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMode {
    Single,
    Multiple,
    Batch,
}

/// Options of a signature request. Unset fields are left to server defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SignatureMode>,
    /// Receivers act in the order they were added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_order: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_reminders: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_reminder_days_cycle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    /// Server filename of an uploaded logo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_signer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_signer: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignatureOptions {
    /// Options with only `mode` set.
    pub fn mode(mode: SignatureMode) -> Self {
        Self {
            mode: Some(mode),
            ..Default::default()
        }
    }

    fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// One receiver as echoed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerResponse {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(rename = "type", default)]
    pub role: Option<String>,
    #[serde(default, alias = "token_signer")]
    pub token: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view of a created (or queried) signature request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub token_requester: String,
    #[serde(default)]
    pub signers: Vec<SignerResponse>,
    #[serde(default)]
    pub status: Option<SignatureStatus>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reusable set of receivers and options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureTemplate {
    #[serde(rename = "template_name")]
    pub name: String,
    #[serde(default, alias = "uuid", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub signers: Vec<Receiver>,
    #[serde(flatten)]
    pub options: SignatureOptions,
}

impl SignatureTemplate {
    /// Parse a template body, dropping task-bound keys.
    pub(crate) fn from_value(value: Value) -> Result<Self> {
        let mut template: SignatureTemplate = serde_json::from_value(value)?;
        template
            .options
            .extra
            .retain(|k, _| !RESERVED_KEYS.contains(&k.as_str()));
        Ok(template)
    }
}

/// A `sign` task with its receivers.
#[derive(Debug)]
pub struct SignTask {
    task: Task,
    requester: Option<Requester>,
    receivers: Vec<Receiver>,
    options: SignatureOptions,
    last_signature: Option<SignatureResponse>,
    last_raw: Option<Value>,
}

impl SignTask {
    pub(crate) fn new(task: Task) -> Self {
        Self {
            task,
            requester: None,
            receivers: Vec::new(),
            options: SignatureOptions::default(),
            last_signature: None,
            last_raw: None,
        }
    }

    /// The underlying `sign` task.
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Mutable access to the underlying task.
    pub fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    /// Drop the receivers and keep the task.
    pub fn into_task(self) -> Task {
        self.task
    }

    /// See [`Task::start`].
    pub async fn start(&mut self) -> Result<&StartResponse> {
        self.task.start().await
    }

    /// See [`Task::add_file`].
    pub async fn add_file(&mut self, source: FileSource) -> Result<&mut TaskFile> {
        self.task.add_file(source).await
    }

    /// See [`Task::add_file_with_params`].
    pub async fn add_file_with_params(
        &mut self,
        source: FileSource,
        params: FileParams,
    ) -> Result<&mut TaskFile> {
        self.task.add_file_with_params(source, params).await
    }

    /// See [`Task::delete_file`].
    pub async fn delete_file(&mut self, server_filename: &str) -> Result<TaskFile> {
        self.task.delete_file(server_filename).await
    }

    /// See [`Task::delete`].
    pub async fn delete(&mut self) -> Result<&DeleteResponse> {
        self.task.delete().await
    }

    /// See [`Task::connect`].
    pub async fn connect(&mut self, next: Tool) -> Result<AnyTask> {
        self.task.connect(next).await
    }

    /// See [`Task::download`].
    pub async fn download(&mut self) -> Result<bytes::Bytes> {
        self.task.download().await
    }

    /// See [`Task::download_to`].
    pub async fn download_to(&mut self, path: &Path) -> Result<u64> {
        self.task.download_to(path).await
    }

    /// Person the request is sent on behalf of.
    pub fn set_requester(&mut self, requester: Requester) -> &mut Self {
        self.requester = Some(requester);
        self
    }

    /// The requester, if set.
    pub fn requester(&self) -> Option<&Requester> {
        self.requester.as_ref()
    }

    /// Defaults applied under the options given to `process`.
    pub fn set_options(&mut self, options: SignatureOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Defaults set with [`set_options`](Self::set_options).
    pub fn options(&self) -> &SignatureOptions {
        &self.options
    }

    /// Receivers in the order they were added.
    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// Receiver with this e-mail, compared case-insensitively.
    pub fn receiver(&self, email: &str) -> Option<&Receiver> {
        self.receivers.iter().find(|r| r.is(email))
    }

    /// Mutable receiver lookup by e-mail.
    pub fn receiver_mut(&mut self, email: &str) -> Option<&mut Receiver> {
        self.receivers.iter_mut().find(|r| r.is(email))
    }

    /// Add a receiver. Receivers are identified by e-mail, case-insensitively.
    pub fn add_receiver(&mut self, receiver: Receiver) -> Result<&mut Receiver> {
        if self.receiver(&receiver.email).is_some() {
            return Err(Error::SignerAlreadyExists(receiver.email));
        }
        self.receivers.push(receiver);
        let last = self.receivers.len() - 1;
        Ok(&mut self.receivers[last])
    }

    /// Remove and return the receiver with this e-mail.
    pub fn remove_receiver(&mut self, email: &str) -> Result<Receiver> {
        let index = self
            .receivers
            .iter()
            .position(|r| r.is(email))
            .ok_or_else(|| Error::SignerNotFound(email.to_string()))?;
        Ok(self.receivers.remove(index))
    }

    /// Last successful signature response.
    pub fn last_signature(&self) -> Option<&SignatureResponse> {
        self.last_signature.as_ref()
    }

    /// The last signature response exactly as received.
    pub fn last_raw_response(&self) -> Option<&Value> {
        self.last_raw.as_ref()
    }

    /// Options layered as construction-time tool options, then
    /// [`set_options`](Self::set_options), then `options`; task-bound keys last.
    fn request_body(&self, id: &str, options: &SignatureOptions) -> Result<Map<String, Value>> {
        let requester = self.requester.as_ref().ok_or_else(|| Error::RequiredParameter {
            tool: Tool::Sign.to_string(),
            parameter: "requester".to_string(),
        })?;

        let mut body = self.task.options().to_map()?;
        body.extend(self.options.to_map()?);
        body.extend(options.to_map()?);
        body.retain(|key, _| {
            let reserved = RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                tracing::warn!("Ignoring reserved signature option '{}'", key);
            }
            !reserved
        });

        body.insert("task".to_string(), Value::String(id.to_string()));
        body.insert("files".to_string(), Value::Array(self.task.files_json()));
        body.insert(
            "signers".to_string(),
            serde_json::to_value(&self.receivers)?,
        );
        body.insert("requester".to_string(), serde_json::to_value(requester)?);
        Ok(body)
    }

    /// Create the signature request.
    pub async fn process(&mut self, options: SignatureOptions) -> Result<&SignatureResponse> {
        let (id, server) = self.task.ensure(Operation::Process)?;
        let body = self.request_body(&id, &options)?;
        let url = self.task.task_url(&server, "signature");

        let reply = self
            .task
            .send(HttpRequest::post(url).json(Value::Object(body)))
            .await?;
        let raw = decode_body(&reply, Error::Process)?;
        let response: SignatureResponse = parse_stage(&raw, SIGNATURE_FIELDS, Error::Process)?;

        self.reconcile(&response).await;
        self.task.mark(Operation::Process);
        tracing::info!(
            "Created signature request {} for task {} with {} receiver(s)",
            response.token_requester,
            id,
            response.signers.len()
        );
        self.last_raw = Some(raw);
        Ok(&*self.last_signature.insert(response))
    }

    /// Copy server tokens and statuses onto the matching local receivers.
    async fn reconcile(&mut self, response: &SignatureResponse) {
        for signer in &response.signers {
            let Some(receiver) = self.receiver_mut(&signer.email) else {
                tracing::warn!("Server returned unknown receiver {}", signer.email);
                continue;
            };
            if let Some(token) = &signer.token {
                receiver.set_token(token.as_str());
            }
            if let Some(status) = &signer.status {
                receiver
                    .apply_remote_status(ReceiverStatus::parse(status))
                    .await;
            }
        }
    }

    /// Save the current receivers and options as a named template.
    pub async fn save_as_template(&mut self, name: &str) -> Result<SignatureTemplate> {
        let (id, server) = self.task.ensure(Operation::Process)?;
        let mut body = self.request_body(&id, &SignatureOptions::default())?;
        body.insert(
            "template_name".to_string(),
            Value::String(name.to_string()),
        );
        let url = self.task.task_url(&server, "signature/template");

        let reply = self
            .task
            .send(HttpRequest::post(url).json(Value::Object(body)))
            .await?;
        let raw = decode_body(&reply, Error::Process)?;
        let template_id = ["template_id", "uuid", "id"]
            .iter()
            .find_map(|key| raw.get(*key))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        tracing::info!("Saved signature template '{}' ({:?})", name, template_id);
        Ok(SignatureTemplate {
            name: name.to_string(),
            template_id,
            signers: self.receivers.iter().map(Receiver::detached).collect(),
            options: self.options.clone(),
        })
    }

    /// Replay a template's receivers and options into this task.
    pub fn apply_template(&mut self, template: &SignatureTemplate) -> Result<()> {
        if let Some(dup) = template
            .signers
            .iter()
            .find(|r| self.receiver(&r.email).is_some())
        {
            return Err(Error::SignerAlreadyExists(dup.email.clone()));
        }
        for receiver in &template.signers {
            self.add_receiver(receiver.detached())?;
        }
        self.options = template.options.clone();
        Ok(())
    }
}
