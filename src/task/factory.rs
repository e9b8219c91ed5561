//! Builds tasks for tool identifiers.

use std::sync::Arc;

use serde_json::Value;

use super::file::TaskFile;
use super::lifecycle::Task;
use super::tool::{Tool, ToolOptions};
use crate::auth::{JwtAuth, TokenProvider};
use crate::config::ApiConfig;
use crate::edit::EditTask;
use crate::error::{Error, Result};
use crate::signature::{SignTask, SignatureManager};
use crate::transport::{ReqwestTransport, Transport};

/// Shared dependencies of every task: the credential provider, the
/// transport and the API configuration.
///
/// Cloning is cheap; every task keeps its own clone so that `connect` can
/// build successors without reconstructing credentials.
#[derive(Clone)]
pub struct TaskFactory {
    auth: Arc<dyn TokenProvider>,
    transport: Arc<dyn Transport>,
    config: Arc<ApiConfig>,
}

impl std::fmt::Debug for TaskFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFactory")
            .field("base_url", &self.config.base_url())
            .finish_non_exhaustive()
    }
}

impl TaskFactory {
    /// Factory over explicit dependencies.
    pub fn new(
        auth: Arc<dyn TokenProvider>,
        transport: Arc<dyn Transport>,
        config: Arc<ApiConfig>,
    ) -> Self {
        Self {
            auth,
            transport,
            config,
        }
    }

    /// Factory using [`JwtAuth`] over the given transport.
    pub fn with_config(config: Arc<ApiConfig>, transport: Arc<dyn Transport>) -> Self {
        let auth = Arc::new(JwtAuth::new(config.clone(), transport.clone()));
        Self::new(auth, transport, config)
    }

    /// Factory using [`JwtAuth`] and the default HTTP transport.
    pub fn from_config(config: ApiConfig) -> Self {
        Self::with_config(Arc::new(config), Arc::new(ReqwestTransport::new()))
    }

    /// [`from_config`](Self::from_config) with `DOCFLOW_*` environment settings.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(ApiConfig::from_env()?))
    }

    /// Credential provider shared by all tasks.
    pub fn auth(&self) -> &Arc<dyn TokenProvider> {
        &self.auth
    }

    /// Transport shared by all tasks.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// API configuration.
    pub fn config(&self) -> &Arc<ApiConfig> {
        &self.config
    }

    /// Build a task for a tool identifier such as `"merge"`.
    pub fn new_task(&self, tool_id: &str, options: ToolOptions) -> Result<AnyTask> {
        let tool: Tool = tool_id.parse()?;
        self.new_tool_task(tool, options)
    }

    /// [`new_task`](Self::new_task) for an already-parsed tool.
    pub fn new_tool_task(&self, tool: Tool, options: ToolOptions) -> Result<AnyTask> {
        Self::validate(tool, &options)?;
        Ok(self.build(Task::new(tool, options, self.clone())))
    }

    /// An empty `sign` task.
    pub fn sign_task(&self) -> SignTask {
        SignTask::new(Task::new(Tool::Sign, ToolOptions::None, self.clone()))
    }

    /// An empty `editpdf` task.
    pub fn edit_task(&self) -> EditTask {
        EditTask::new(Task::new(Tool::EditPdf, ToolOptions::None, self.clone()))
    }

    /// Admin client for existing signature requests.
    pub fn signature_manager(&self) -> SignatureManager {
        SignatureManager::new(self.clone())
    }

    /// A task that already exists on `server`, e.g. the target of `connect`.
    pub fn resume_task(
        &self,
        tool: Tool,
        options: ToolOptions,
        id: String,
        server: String,
        files: Vec<TaskFile>,
    ) -> Result<AnyTask> {
        Self::validate(tool, &options)?;
        Ok(self.build(Task::resume(tool, options, self.clone(), id, server, files)))
    }

    fn build(&self, task: Task) -> AnyTask {
        match task.tool() {
            Tool::Sign => AnyTask::Sign(SignTask::new(task)),
            Tool::EditPdf => AnyTask::Edit(EditTask::new(task)),
            _ => AnyTask::Tool(task),
        }
    }

    /// Check the options a tool cannot run without.
    pub(crate) fn validate(tool: Tool, options: &ToolOptions) -> Result<()> {
        if let Some(owner) = options.tool() {
            if owner != tool {
                tracing::warn!("{} options given to a {} task", owner, tool);
            }
        }

        let required = tool.required_parameters();
        if required.is_empty() {
            return Ok(());
        }
        let bag = options.to_map()?;
        for parameter in required {
            let present = matches!(bag.get(*parameter), Some(Value::String(s)) if !s.is_empty());
            if !present {
                return Err(Error::RequiredParameter {
                    tool: tool.to_string(),
                    parameter: parameter.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A task of any variant.
#[derive(Debug)]
pub enum AnyTask {
    Tool(Task),
    Sign(SignTask),
    Edit(EditTask),
}

impl AnyTask {
    /// The underlying task, borrowed.
    pub fn task(&self) -> &Task {
        match self {
            Self::Tool(task) => task,
            Self::Sign(sign) => sign.task(),
            Self::Edit(edit) => edit.task(),
        }
    }

    /// The underlying task, mutably borrowed.
    pub fn task_mut(&mut self) -> &mut Task {
        match self {
            Self::Tool(task) => task,
            Self::Sign(sign) => sign.task_mut(),
            Self::Edit(edit) => edit.task_mut(),
        }
    }

    /// Tool of the underlying task.
    pub fn tool(&self) -> Tool {
        self.task().tool()
    }

    /// The underlying task, whatever the variant.
    pub fn into_task(self) -> Task {
        match self {
            Self::Tool(task) => task,
            Self::Sign(sign) => sign.into_task(),
            Self::Edit(edit) => edit.into_task(),
        }
    }

    /// The sign task, if this is one.
    pub fn into_sign(self) -> Option<SignTask> {
        match self {
            Self::Sign(sign) => Some(sign),
            _ => None,
        }
    }

    /// The edit task, if this is one.
    pub fn into_edit(self) -> Option<EditTask> {
        match self {
            Self::Edit(edit) => Some(edit),
            _ => None,
        }
    }
}
