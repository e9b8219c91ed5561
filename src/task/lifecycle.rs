//! The task state machine.
//!
//! A [`Task`] is the client-side handle for one remote tool invocation:
//!
//! ```text
//!   Unstarted --start--> Started --process--> Processed --download--> Downloaded
//!                          |  ^                   |                       |
//!                add/delete file                  +-----connect-----------+--> new Task (Started)
//!                          |                      |
//!                          +-------delete---------+----------> Deleted
//! ```
//!
//! Every network call obtains a token from the factory's [`TokenProvider`]
//! and goes through its [`Transport`]. No call other than `start` is sent
//! before the task has an id and an assigned server.
//!
//! [`TokenProvider`]: crate::auth::TokenProvider
//! [`Transport`]: crate::transport::Transport

use std::path::Path;

use bytes::Bytes;
use serde_json::{json, Map, Value};

use super::factory::{AnyTask, TaskFactory};
use super::file::{FileParams, FileSource, TaskFile, UploadPayload};
use super::response::{
    is_falsy_payload, parse_reply, ConnectResponse, DeleteResponse, ProcessResponse,
    StartResponse, UploadResponse, CONNECT_FIELDS, DELETE_FIELDS, PROCESS_FIELDS, START_FIELDS,
    UPLOAD_FIELDS,
};
use super::state::{Operation, TaskState};
use super::tool::{ProcessOptions, Tool, ToolOptions};
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, MultipartForm};

/// Process request keys owned by the task; caller options cannot replace them.
const RESERVED_KEYS: [&str; 3] = ["task", "tool", "files"];

/// Last successful response of each operation. Each slot is replaced
/// wholesale by the next successful call.
#[derive(Debug, Clone, Default)]
pub struct LastResponses {
    pub start: Option<StartResponse>,
    pub process: Option<ProcessResponse>,
    pub delete: Option<DeleteResponse>,
    pub connect: Option<ConnectResponse>,
}

#[derive(Debug)]
pub struct Task {
    tool: Tool,
    options: ToolOptions,
    id: Option<String>,
    server: Option<String>,
    files: Vec<TaskFile>,
    state: TaskState,
    last: LastResponses,
    factory: TaskFactory,
}

impl Task {
    pub(crate) fn new(tool: Tool, options: ToolOptions, factory: TaskFactory) -> Self {
        Self {
            tool,
            options,
            id: None,
            server: None,
            files: Vec::new(),
            state: TaskState::Unstarted,
            last: LastResponses::default(),
            factory,
        }
    }

    /// A task that already exists remotely (the successor of `connect`).
    pub(crate) fn resume(
        tool: Tool,
        options: ToolOptions,
        factory: TaskFactory,
        id: String,
        server: String,
        files: Vec<TaskFile>,
    ) -> Self {
        Self {
            id: Some(id),
            server: Some(server),
            files,
            state: TaskState::Started,
            ..Self::new(tool, options, factory)
        }
    }

    /// Tool this task runs.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Options given at construction.
    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    /// Remote task id, once started.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Server assigned by `start`.
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Uploaded files in upload order.
    pub fn files(&self) -> &[TaskFile] {
        &self.files
    }

    /// Mutable handle on an uploaded file, to set per-file parameters.
    pub fn file_mut(&mut self, server_filename: &str) -> Option<&mut TaskFile> {
        self.files
            .iter_mut()
            .find(|f| f.server_filename == server_filename)
    }

    /// All last-response slots.
    pub fn last_responses(&self) -> &LastResponses {
        &self.last
    }

    /// Last successful `start` response.
    pub fn last_start(&self) -> Option<&StartResponse> {
        self.last.start.as_ref()
    }

    /// Last successful `process` response.
    pub fn last_process(&self) -> Option<&ProcessResponse> {
        self.last.process.as_ref()
    }

    /// Last successful `delete` response.
    pub fn last_delete(&self) -> Option<&DeleteResponse> {
        self.last.delete.as_ref()
    }

    /// Last successful `connect` response.
    pub fn last_connect(&self) -> Option<&ConnectResponse> {
        self.last.connect.as_ref()
    }

    /// Factory holding this task's credentials and transport.
    pub fn factory(&self) -> &TaskFactory {
        &self.factory
    }

    /// Id and server of a started task.
    fn binding(&self) -> Result<(&str, &str)> {
        match (self.id.as_deref(), self.server.as_deref()) {
            (Some(id), Some(server)) => Ok((id, server)),
            _ => Err(Error::TaskNotStarted),
        }
    }

    /// Fail unless `op` may run now; returns the task binding.
    pub(crate) fn ensure(&self, op: Operation) -> Result<(String, String)> {
        let (id, server) = self.binding()?;
        self.state.check(op)?;
        Ok((id.to_string(), server.to_string()))
    }

    pub(crate) fn mark(&mut self, op: Operation) {
        self.state = self.state.after(op);
    }

    pub(crate) fn task_url(&self, server: &str, path: &str) -> String {
        format!("{}/{}", self.factory.config().server_url(server), path)
    }

    /// Authorize and send a request.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.factory.auth().get_token().await?;
        tracing::debug!("{} {}", request.method, request.url);
        Ok(self.factory.transport().send(request.bearer(&token)).await?)
    }

    /// The `files` array of process-style requests.
    pub(crate) fn files_json(&self) -> Vec<Value> {
        self.files.iter().map(TaskFile::to_json).collect()
    }

    /// Obtain a task id and an assigned server.
    ///
    /// Restarting drops the file list: uploaded filenames belong to the
    /// previous server assignment.
    pub async fn start(&mut self) -> Result<&StartResponse> {
        self.state.check(Operation::Start)?;
        if !self.files.is_empty() {
            tracing::warn!(
                "Restarting {} task {:?} discards {} uploaded file(s)",
                self.tool,
                self.id,
                self.files.len()
            );
        }

        let url = format!("{}/start/{}", self.factory.config().base_url(), self.tool);
        let response = self.send(HttpRequest::get(url)).await?;
        let start: StartResponse = parse_reply(&response, START_FIELDS, Error::Start)?;

        self.id = Some(start.task.clone());
        self.server = Some(start.server.clone());
        self.files.clear();
        self.mark(Operation::Start);
        tracing::info!(
            "Started {} task {} on {}",
            self.tool,
            start.task,
            start.server
        );
        Ok(&*self.last.start.insert(start))
    }

    /// Upload a file and append it to the task.
    ///
    /// The returned handle can be used to set per-file parameters before
    /// processing.
    pub async fn add_file(&mut self, source: FileSource) -> Result<&mut TaskFile> {
        self.add_file_with_params(source, FileParams::default())
            .await
    }

    /// Upload a file with per-file parameters already set.
    pub async fn add_file_with_params(
        &mut self,
        source: FileSource,
        params: FileParams,
    ) -> Result<&mut TaskFile> {
        let (id, server) = self.ensure(Operation::AddFile)?;
        let url = self.task_url(&server, "upload");

        let (request, filename) = match source.resolve().await? {
            UploadPayload::Cloud { url: cloud, filename } => (
                HttpRequest::post(url).json(json!({ "task": id, "cloud_file": cloud })),
                filename,
            ),
            UploadPayload::Content { filename, data } => {
                let form = MultipartForm::default()
                    .text("task", id.as_str())
                    .file("file", filename.as_str(), data);
                (HttpRequest::post(url).multipart(form), filename)
            }
        };

        let response = self.send(request).await?;
        let upload: UploadResponse = parse_reply(&response, UPLOAD_FIELDS, Error::Upload)?;
        tracing::debug!(
            "Uploaded {} as {} to task {}",
            filename,
            upload.server_filename,
            id
        );

        self.files.push(TaskFile {
            server_filename: upload.server_filename,
            filename,
            params,
        });
        self.mark(Operation::AddFile);
        let last = self.files.len() - 1;
        Ok(&mut self.files[last])
    }

    /// Remove an uploaded file from the task and from the server.
    pub async fn delete_file(&mut self, server_filename: &str) -> Result<TaskFile> {
        let (id, server) = self.ensure(Operation::DeleteFile)?;
        let index = self
            .files
            .iter()
            .position(|f| f.server_filename == server_filename)
            .ok_or_else(|| Error::FileNotFound(server_filename.to_string()))?;

        let url = self.task_url(&server, "upload/delete");
        self.send(
            HttpRequest::post(url).json(json!({ "task": id, "server_filename": server_filename })),
        )
        .await?;

        self.mark(Operation::DeleteFile);
        Ok(self.files.remove(index))
    }

    /// Build the process request body: caller options, then the task's
    /// construction-time options, then the reserved keys.
    fn process_body(&self, id: &str, options: ProcessOptions) -> Result<Map<String, Value>> {
        let mut body = Map::new();
        for (key, value) in options {
            if RESERVED_KEYS.contains(&key.as_str()) {
                tracing::warn!("Ignoring reserved process option '{}'", key);
                continue;
            }
            body.insert(key, value);
        }
        for (key, value) in self.options.to_map()? {
            body.entry(key).or_insert(value);
        }
        body.insert("task".to_string(), Value::String(id.to_string()));
        body.insert("tool".to_string(), Value::String(self.tool.to_string()));
        body.insert("files".to_string(), Value::Array(self.files_json()));
        Ok(body)
    }

    /// Run the tool on the uploaded files.
    pub async fn process(&mut self, options: ProcessOptions) -> Result<&ProcessResponse> {
        let (id, server) = self.ensure(Operation::Process)?;
        let body = self.process_body(&id, options)?;
        let url = self.task_url(&server, "process");

        let response = self.send(HttpRequest::post(url).json(Value::Object(body))).await?;
        let processed: ProcessResponse = parse_reply(&response, PROCESS_FIELDS, Error::Process)?;

        self.mark(Operation::Process);
        tracing::info!(
            "Processed {} task {}: {} ({} bytes)",
            self.tool,
            id,
            processed.download_filename,
            processed.output_filesize
        );
        Ok(&*self.last.process.insert(processed))
    }

    /// Fetch the processed output.
    ///
    /// An empty payload is always an error: no tool produces empty output.
    pub async fn download(&mut self) -> Result<Bytes> {
        let (id, server) = self.ensure(Operation::Download)?;
        let url = self.task_url(&server, &format!("download/{}", id));

        let response = self.send(HttpRequest::get(url).binary()).await?;
        if is_falsy_payload(&response.body) {
            return Err(Error::Download(format!(
                "empty payload for task {}",
                id
            )));
        }

        self.mark(Operation::Download);
        tracing::debug!("Downloaded {} bytes for task {}", response.body.len(), id);
        Ok(response.body)
    }

    /// Download the output and write it to `path`.
    pub async fn download_to(&mut self, path: &Path) -> Result<u64> {
        let data = self.download().await?;
        tokio::fs::write(path, &data).await?;
        Ok(data.len() as u64)
    }

    /// Delete the task and its files on the server.
    pub async fn delete(&mut self) -> Result<&DeleteResponse> {
        let (id, server) = self.ensure(Operation::Delete)?;
        let url = self.task_url(&server, &format!("task/{}", id));

        let response = self.send(HttpRequest::delete(url)).await?;
        let deleted: DeleteResponse = parse_reply(&response, DELETE_FIELDS, Error::Delete)?;

        self.mark(Operation::Delete);
        tracing::info!("Deleted {} task {}", self.tool, id);
        Ok(&*self.last.delete.insert(deleted))
    }

    /// Chain the output of this task into a new task for `next`.
    pub async fn connect(&mut self, next: Tool) -> Result<AnyTask> {
        self.connect_with_options(next, ToolOptions::None).await
    }

    /// [`connect`](Self::connect) with options for the successor. They are
    /// validated before any request is sent.
    pub async fn connect_with_options(
        &mut self,
        next: Tool,
        options: ToolOptions,
    ) -> Result<AnyTask> {
        let (id, server) = self.ensure(Operation::Connect)?;
        TaskFactory::validate(next, &options)?;
        let url = self.task_url(&server, "task/next");

        let response = self
            .send(HttpRequest::post(url).json(json!({ "task": id, "tool": next })))
            .await?;
        let connected: ConnectResponse = parse_reply(&response, CONNECT_FIELDS, Error::Connect)?;

        let files = connected
            .files
            .iter()
            .map(|(server_filename, filename)| {
                filename
                    .as_str()
                    .map(|name| TaskFile::new(server_filename.as_str(), name))
                    .ok_or_else(|| {
                        Error::Connect(format!("filename for '{}' is not a string", server_filename))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let successor = self.factory.resume_task(
            next,
            options,
            connected.task.clone(),
            server,
            files,
        )?;
        tracing::info!(
            "Connected {} task {} to {} task {}",
            self.tool,
            id,
            next,
            connected.task
        );
        self.last.connect = Some(connected);
        Ok(successor)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::{Method, RequestBody, TransportError};
    use std::sync::Arc;

    pub(crate) fn factory_with(transport: Arc<MockTransport>) -> TaskFactory {
        let config = crate::config::ApiConfig::new("pk")
            .with_secret_key("sk")
            .with_host("api.example.com");
        TaskFactory::with_config(Arc::new(config), transport)
    }

    pub(crate) fn process_reply() -> Value {
        json!({
            "download_filename": "merged.pdf",
            "filesize": 2048,
            "output_filesize": 1900,
            "output_filenumber": 1,
            "output_extensions": "[\"pdf\"]",
            "timer": "0.412",
            "status": "TaskSuccess"
        })
    }

    pub(crate) fn mock_start(transport: &MockTransport, tool: &str) {
        transport.on_json(
            Method::Get,
            &format!("/v1/start/{}", tool),
            json!({"server": "api8.example.com", "task": "task-1"}),
        );
    }

    fn merge_task(transport: &Arc<MockTransport>) -> Task {
        factory_with(transport.clone())
            .new_task("merge", ToolOptions::None)
            .unwrap()
            .into_task()
    }

    #[tokio::test]
    async fn test_operations_before_start_fail_without_io() {
        let transport = Arc::new(MockTransport::new());
        let mut task = merge_task(&transport);

        assert!(matches!(
            task.add_file(FileSource::url("https://x.io/a.pdf")).await,
            Err(Error::TaskNotStarted)
        ));
        assert!(matches!(
            task.process(ProcessOptions::new()).await,
            Err(Error::TaskNotStarted)
        ));
        assert!(matches!(task.download().await, Err(Error::TaskNotStarted)));
        assert!(matches!(task.delete().await, Err(Error::TaskNotStarted)));
        assert!(matches!(
            task.connect(Tool::Compress).await,
            Err(Error::TaskNotStarted)
        ));
        assert!(matches!(
            task.delete_file("srv.pdf").await,
            Err(Error::TaskNotStarted)
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_start_requires_server_and_task() {
        let transport = Arc::new(MockTransport::new());
        transport.on_json(Method::Get, "/v1/start/merge", json!({"server": "api8.example.com"}));
        let mut task = merge_task(&transport);

        assert!(matches!(task.start().await, Err(Error::Start(_))));
        assert_eq!(task.state(), TaskState::Unstarted);
        assert!(task.id().is_none());
    }

    #[tokio::test]
    async fn test_start_binds_task_and_sends_bearer() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        let mut task = merge_task(&transport);

        task.start().await.unwrap();
        assert_eq!(task.id(), Some("task-1"));
        assert_eq!(task.server(), Some("api8.example.com"));
        assert_eq!(task.state(), TaskState::Started);

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://api.example.com/v1/start/merge");
        assert!(requests[0]
            .header_value("authorization")
            .unwrap()
            .starts_with("Bearer "));
    }

    #[tokio::test]
    async fn test_merge_end_to_end() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport
            .on_json(Method::Post, "/v1/upload", json!({"server_filename": "srv-a.pdf"}))
            .on_json(Method::Post, "/v1/upload", json!({"server_filename": "srv-b.pdf"}))
            .on_json(Method::Post, "/v1/process", process_reply())
            .on(
                Method::Get,
                "/v1/download/task-1",
                HttpResponse::new(200, b"%PDF-1.7 merged".to_vec()),
            );

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        task.add_file(FileSource::url("https://files.example.com/a.pdf"))
            .await
            .unwrap();
        task.add_file(FileSource::bytes("b.pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap()
            .set_rotation(crate::task::Rotation::Clockwise90);

        let processed = task.process(ProcessOptions::new()).await.unwrap();
        assert_eq!(processed.download_filename, "merged.pdf");
        assert_eq!(task.state(), TaskState::Processed);

        let body = transport.last_json("/v1/process").unwrap();
        assert_eq!(body["task"], "task-1");
        assert_eq!(body["tool"], "merge");
        assert_eq!(
            body["files"],
            json!([
                {"server_filename": "srv-a.pdf", "filename": "a.pdf"},
                {"server_filename": "srv-b.pdf", "filename": "b.pdf", "rotate": 90}
            ])
        );

        let payload = task.download().await.unwrap();
        assert!(!payload.is_empty());
        assert_eq!(task.state(), TaskState::Downloaded);

        let upload_urls: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.url.ends_with("/upload"))
            .map(|r| (r.url, matches!(r.body, RequestBody::Multipart(_))))
            .collect();
        assert_eq!(
            upload_urls,
            vec![
                ("https://api8.example.com/v1/upload".to_string(), false),
                ("https://api8.example.com/v1/upload".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_process_missing_status_is_process_error() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        let mut reply = process_reply();
        reply.as_object_mut().unwrap().remove("status");
        transport.on_json(Method::Post, "/v1/process", reply);

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        match task.process(ProcessOptions::new()).await {
            Err(Error::Process(msg)) => assert!(msg.contains("status")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(task.state(), TaskState::Started);
        assert!(task.last_process().is_none());
    }

    #[tokio::test]
    async fn test_process_options_cannot_rebind_task() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "compress");
        transport.on_json(Method::Post, "/v1/process", process_reply());

        let mut task = factory_with(transport.clone())
            .new_task(
                "compress",
                ToolOptions::Compress(crate::task::CompressOptions {
                    compression_level: Some(crate::task::CompressionLevel::Extreme),
                }),
            )
            .unwrap()
            .into_task();
        task.start().await.unwrap();

        let mut options = ProcessOptions::new();
        options.insert("task".to_string(), json!("other-task"));
        options.insert("output_filename".to_string(), json!("{filename}_small"));
        task.process(options).await.unwrap();

        let body = transport.last_json("/v1/process").unwrap();
        assert_eq!(body["task"], "task-1");
        assert_eq!(body["compression_level"], "extreme");
        assert_eq!(body["output_filename"], "{filename}_small");
    }

    fn html_page() -> HttpResponse {
        HttpResponse::new(200, b"<html>502 Bad Gateway</html>".to_vec())
    }

    #[tokio::test]
    async fn test_non_json_replies_are_stage_errors() {
        let transport = Arc::new(MockTransport::new());
        transport.on(Method::Get, "/v1/start/merge", html_page());
        let mut task = merge_task(&transport);
        assert!(matches!(task.start().await, Err(Error::Start(_))));
        assert_eq!(task.state(), TaskState::Unstarted);

        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport
            .on(Method::Post, "/v1/upload", html_page())
            .on(Method::Post, "/v1/process", html_page())
            .on(Method::Delete, "/v1/task/task-1", html_page());
        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        assert!(matches!(
            task.add_file(FileSource::url("https://x.io/a.pdf")).await,
            Err(Error::Upload(_))
        ));
        assert!(matches!(
            task.process(ProcessOptions::new()).await,
            Err(Error::Process(_))
        ));
        assert!(matches!(task.delete().await, Err(Error::Delete(_))));
        assert_eq!(task.state(), TaskState::Started);

        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport
            .on_json(Method::Post, "/v1/process", process_reply())
            .on(Method::Post, "/v1/task/next", html_page());
        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        task.process(ProcessOptions::new()).await.unwrap();
        assert!(matches!(
            task.connect(Tool::Compress).await,
            Err(Error::Connect(_))
        ));
    }

    #[tokio::test]
    async fn test_falsy_download_is_error() {
        for payload in ["", "false", "null", "undefined"] {
            let transport = Arc::new(MockTransport::new());
            mock_start(&transport, "merge");
            transport
                .on_json(Method::Post, "/v1/process", process_reply())
                .on(
                    Method::Get,
                    "/v1/download/task-1",
                    HttpResponse::new(200, payload.as_bytes().to_vec()),
                );

            let mut task = merge_task(&transport);
            task.start().await.unwrap();
            task.process(ProcessOptions::new()).await.unwrap();
            assert!(
                matches!(task.download().await, Err(Error::Download(_))),
                "payload {payload:?}"
            );
            assert_eq!(task.state(), TaskState::Processed);
        }
    }

    #[tokio::test]
    async fn test_download_requires_processing() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        let mut task = merge_task(&transport);
        task.start().await.unwrap();

        assert!(matches!(
            task.download().await,
            Err(Error::InvalidState { .. })
        ));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_without_server_filename_is_upload_error() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport.on_json(Method::Post, "/v1/upload", json!({"status": "ok"}));

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        assert!(matches!(
            task.add_file(FileSource::url("https://x.io/a.pdf")).await,
            Err(Error::Upload(_))
        ));
        assert!(task.files().is_empty());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport
            .on_json(Method::Post, "/v1/upload", json!({"server_filename": "srv-a.pdf"}))
            .on_json(Method::Post, "/v1/upload/delete", json!({}));

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        task.add_file(FileSource::url("https://x.io/a.pdf"))
            .await
            .unwrap();

        assert!(matches!(
            task.delete_file("unknown.pdf").await,
            Err(Error::FileNotFound(_))
        ));
        let removed = task.delete_file("srv-a.pdf").await.unwrap();
        assert_eq!(removed.filename, "a.pdf");
        assert!(task.files().is_empty());
        assert_eq!(
            transport.last_json("/v1/upload/delete").unwrap(),
            json!({"task": "task-1", "server_filename": "srv-a.pdf"})
        );
    }

    #[tokio::test]
    async fn test_delete_task() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        let mut reply = process_reply();
        let extra = json!({
            "file_number": "2",
            "process_start": "2024-01-01 10:00:00",
            "server": "api8.example.com",
            "status_message": "",
            "tool": "merge"
        });
        reply
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        transport.on_json(Method::Delete, "/v1/task/task-1", reply);

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        let deleted = task.delete().await.unwrap();
        assert_eq!(deleted.file_number, 2);
        assert_eq!(task.state(), TaskState::Deleted);
        assert!(matches!(task.start().await, Err(Error::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_field_is_delete_error() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport.on_json(Method::Delete, "/v1/task/task-1", process_reply());

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        assert!(matches!(task.delete().await, Err(Error::Delete(_))));
        assert_eq!(task.state(), TaskState::Started);
    }

    #[tokio::test]
    async fn test_connect_builds_successor() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "split");
        transport
            .on_json(Method::Post, "/v1/process", process_reply())
            .on_json(
                Method::Post,
                "/v1/task/next",
                json!({
                    "task": "task-2",
                    "files": {"srv-part-2.pdf": "doc-2.pdf", "srv-part-1.pdf": "doc-1.pdf"}
                }),
            );

        let mut split = factory_with(transport.clone())
            .new_task("split", ToolOptions::None)
            .unwrap()
            .into_task();
        split.start().await.unwrap();
        split.process(ProcessOptions::new()).await.unwrap();

        let merge = split.connect(Tool::Merge).await.unwrap().into_task();
        assert_eq!(merge.tool(), Tool::Merge);
        assert_eq!(merge.id(), Some("task-2"));
        assert_eq!(merge.server(), split.server());
        assert_eq!(merge.state(), TaskState::Started);
        assert_eq!(
            merge.files(),
            &[
                TaskFile::new("srv-part-2.pdf", "doc-2.pdf"),
                TaskFile::new("srv-part-1.pdf", "doc-1.pdf"),
            ]
        );
        assert_eq!(
            transport.last_json("/v1/task/next").unwrap(),
            json!({"task": "task-1", "tool": "merge"})
        );
        assert_eq!(split.last_connect().unwrap().task, "task-2");
    }

    #[tokio::test]
    async fn test_connect_missing_files_is_connect_error() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "split");
        transport
            .on_json(Method::Post, "/v1/process", process_reply())
            .on_json(Method::Post, "/v1/task/next", json!({"task": "task-2"}));

        let mut split = factory_with(transport.clone())
            .new_task("split", ToolOptions::None)
            .unwrap()
            .into_task();
        split.start().await.unwrap();
        split.process(ProcessOptions::new()).await.unwrap();
        assert!(matches!(
            split.connect(Tool::Merge).await,
            Err(Error::Connect(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_to_protect_requires_password() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport.on_json(Method::Post, "/v1/process", process_reply());

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        task.process(ProcessOptions::new()).await.unwrap();
        assert!(matches!(
            task.connect(Tool::Protect).await,
            Err(Error::RequiredParameter { .. })
        ));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through() {
        let transport = Arc::new(MockTransport::new());
        transport.on_error(
            Method::Get,
            "/v1/start/merge",
            TransportError::Timeout("slow".to_string()),
        );
        let mut task = merge_task(&transport);
        assert!(matches!(
            task.start().await,
            Err(Error::Transport(TransportError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_download_to_writes_file() {
        let transport = Arc::new(MockTransport::new());
        mock_start(&transport, "merge");
        transport
            .on_json(Method::Post, "/v1/process", process_reply())
            .on(
                Method::Get,
                "/v1/download/task-1",
                HttpResponse::new(200, b"PK\x03\x04zip".to_vec()),
            );

        let mut task = merge_task(&transport);
        task.start().await.unwrap();
        task.process(ProcessOptions::new()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.zip");
        let written = task.download_to(&out).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(std::fs::read(&out).unwrap(), b"PK\x03\x04zip");
    }
}
