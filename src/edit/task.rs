use std::path::Path;

use bytes::Bytes;
use serde_json::Value;

use super::element::{Element, ElementId};
use crate::error::{Error, Result};
use crate::task::{
    AnyTask, DeleteResponse, FileParams, FileSource, ProcessOptions, ProcessResponse,
    StartResponse, Task, TaskFile, Tool,
};

/// An `editpdf` task and the elements it will place.
#[derive(Debug)]
pub struct EditTask {
    task: Task,
    elements: Vec<(ElementId, Element)>,
}

impl EditTask {
    pub(crate) fn new(task: Task) -> Self {
        Self {
            task,
            elements: Vec::new(),
        }
    }

    /// The underlying `editpdf` task.
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Mutable access to the underlying task.
    pub fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    /// Drop the queued elements and keep the task.
    pub fn into_task(self) -> Task {
        self.task
    }

    /// Queue an element; an identical element is rejected.
    pub fn add_element(&mut self, element: Element) -> Result<ElementId> {
        if self.elements.iter().any(|(_, e)| *e == element) {
            return Err(Error::ElementAlreadyExists(format!(
                "{} element on pages {}",
                element.type_name(),
                element.pages
            )));
        }
        let id = ElementId::new();
        self.elements.push((id, element));
        Ok(id)
    }

    /// Remove a queued element by id.
    pub fn delete_element(&mut self, id: ElementId) -> Result<Element> {
        let index = self
            .elements
            .iter()
            .position(|(eid, _)| *eid == id)
            .ok_or_else(|| Error::ElementNotFound(id.to_string()))?;
        Ok(self.elements.remove(index).1)
    }

    /// Queued element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, e)| e)
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().map(|(_, e)| e)
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

    /// Process with the queued elements under `elements`.
    pub async fn process(&mut self, mut options: ProcessOptions) -> Result<&ProcessResponse> {
        let elements = self
            .elements
            .iter()
            .map(|(_, e)| serde_json::to_value(e))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if options.contains_key("elements") {
            tracing::warn!("Replacing caller-supplied 'elements' with the queued elements");
        }
        options.insert("elements".to_string(), Value::Array(elements));
        self.task.process(options).await
    }

    /// See [`Task::download`].
    pub async fn download(&mut self) -> Result<Bytes> {
        self.task.download().await
    }

    /// See [`Task::download_to`].
    pub async fn download_to(&mut self, path: &Path) -> Result<u64> {
        self.task.download_to(path).await
    }

    /// See [`Task::delete`].
    pub async fn delete(&mut self) -> Result<&DeleteResponse> {
        self.task.delete().await
    }

    /// See [`Task::connect`].
    pub async fn connect(&mut self, next: Tool) -> Result<AnyTask> {
        self.task.connect(next).await
    }
}
