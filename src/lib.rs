//! # docflow
//!
//! Client for a remote document-processing service.
//!
//! This library provides:
//! - A task state machine bound to one remote tool (merge, split, compress, ...)
//! - Tool pipelines: the output of one task feeds a new task without re-uploading
//! - JWT credentials, signed locally or exchanged at `/auth`, cached until expiry
//! - Multi-party signature requests and their administrative calls
//! - An edit overlay for placing text, image and svg elements on pages
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │           TaskFactory            │
//!        │   (tool dispatch, validation)    │
//!        └────────────────┬─────────────────┘
//!                         │ builds
//!         ┌───────────────┼────────────────┐
//!         ▼               ▼                ▼
//!    ┌─────────┐    ┌──────────┐     ┌──────────┐
//!    │  Task   │    │ SignTask │     │ EditTask │
//!    └────┬────┘    └────┬─────┘     └────┬─────┘
//!         └──────────────┼────────────────┘
//!                        ▼
//!        ┌───────────────┐   ┌─────────────────┐
//!        │ TokenProvider │   │    Transport    │
//!        │   (JwtAuth)   │   │ (reqwest / mock)│
//!        └───────────────┘   └─────────────────┘
//! ```
//!
//! ## Task Flow
//! 1. `start` obtains a task id and an assigned server
//! 2. `add_file` uploads inputs (multipart or cloud URL)
//! 3. `process` runs the tool remotely
//! 4. `download` fetches the result, or `connect` chains a next tool
//!
//! ## Modules
//! - `task`: Task, TaskFactory, tools and their options
//! - `signature`: SignTask, receivers, SignatureManager
//! - `edit`: EditTask and overlay elements
//! - `auth`: token providers
//! - `transport`: HTTP capability trait and the reqwest implementation

pub mod auth;
pub mod config;
pub mod edit;
pub mod error;
pub mod signature;
pub mod task;
pub mod transport;

pub use auth::{JwtAuth, TokenProvider};
pub use config::ApiConfig;
pub use error::{Error, Result};
pub use task::{AnyTask, FileSource, ProcessOptions, Task, TaskFactory, Tool, ToolOptions};
