//! Multi-party signature requests.
//!
//! ```text
//!   SignTask ──┬── Requester
//!              ├── Receiver (signer | validator | witness) ── SignatureFile ── SignatureElement
//!              └── process ──> POST /signature ──> SignatureResponse (tokens, statuses)
//!
//!   SignatureManager ── token-keyed admin calls (status, void, reminders, downloads, fixes)
//! ```
//!
//! Receiver statuses are server-authoritative: they change only when a
//! server response is reconciled onto the local receivers.

mod events;
mod file;
mod manager;
mod receiver;
mod status;
mod task;

pub use events::{EventRegistry, SignerEvent, SignerEventKind, SignerHandler};
pub use file::{SignatureElement, SignatureElementType, SignatureFile};
pub use manager::{Pagination, ReceiverInfo, SignatureList, SignatureManager};
pub use receiver::{Receiver, Requester, Role};
pub use status::{ReceiverStatus, SignatureStatus};
pub use task::{
    SignTask, SignatureMode, SignatureOptions, SignatureResponse, SignatureTemplate,
    SignerResponse,
};
