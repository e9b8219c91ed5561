//! Tasks: one remote tool invocation each.
//!
//! - [`Task`] drives the lifecycle (start, upload, process, download, delete)
//!   and chains tools with `connect`.
//! - [`TaskFactory`] maps tool identifiers to tasks and holds the shared
//!   credential provider and transport.
//! - [`Tool`] / [`ToolOptions`] name the remote tools and their option bags.

mod factory;
mod file;
mod lifecycle;
mod response;
mod state;
mod tool;

pub use factory::{AnyTask, TaskFactory};
pub use file::{FileParams, FileSource, Rotation, TaskFile};
pub use response::{
    ConnectResponse, DeleteResponse, ProcessResponse, StartResponse, UploadResponse,
};
pub use state::{Operation, TaskState};
pub use lifecycle::{LastResponses, Task};
pub use tool::{
    CompressOptions, CompressionLevel, PageNumberOptions, PdfAOptions, PdfJpgMode,
    PdfJpgOptions, PdfOcrOptions, ProcessOptions, ProtectOptions, SplitMode, SplitOptions, Tool,
    ToolOptions, WatermarkMode, WatermarkOptions,
};

pub(crate) use response::{decode_body, is_falsy_payload, parse_stage};

#[cfg(test)]
pub(crate) use lifecycle::tests as test_support;
