//! Receiver event hooks.
//!
//! Handlers are kept per event kind in registration order. [`EventRegistry::emit`]
//! awaits each handler to completion before calling the next one.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerEventKind {
    StatusChanged,
    EmailChanged,
    PhoneChanged,
}

/// A change observed on a receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct SignerEvent {
    pub kind: SignerEventKind,
    /// Receiver e-mail at the time of the event (the new one for `EmailChanged`)
    pub email: String,
    pub old: Option<String>,
    pub new: String,
}

pub type SignerHandler = Arc<dyn Fn(&SignerEvent) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct EventRegistry {
    handlers: HashMap<SignerEventKind, Vec<SignerHandler>>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

impl EventRegistry {
    pub fn on<F>(&mut self, kind: SignerEventKind, handler: F)
    where
        F: Fn(&SignerEvent) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    pub fn handler_count(&self, kind: SignerEventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub async fn emit(&self, event: SignerEvent) {
        let Some(handlers) = self.handlers.get(&event.kind) else {
            return;
        };
        tracing::debug!(
            "Emitting {:?} for {} to {} handler(s)",
            event.kind,
            event.email,
            handlers.len()
        );
        for handler in handlers {
            handler(&event).await;
        }
    }
}
