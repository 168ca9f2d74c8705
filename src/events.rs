//! Navigator events and the per-instance observer list.
//!
//! Handlers are registered per `EventKind` and fire in registration order.
//! `subscribe` hands back a `Subscription`; dropping it leaves the handler
//! installed for the lifetime of the bus, `cancel` removes it.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::book::{BookMetadata, Chapter};
use crate::error::EpubError;

/// Event categories a handler can subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Initialization finished
    Loaded,
    /// The cursor moved
    ChapterChanged,
    /// A resolution step failed and was recovered from
    Error,
}

/// Why a book reference could not be used as given
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveFailure {
    /// No source recognized the reference
    Unrecognized {
        /// The reference as supplied
        reference: String,
    },
    /// A source recognized the reference but could not read it
    ParseFailed {
        /// Name of the source that failed
        source_name: &'static str,
        /// Underlying error
        error: EpubError,
    },
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveFailure::Unrecognized { reference } => {
                write!(f, "unrecognized book reference '{}'", reference)
            }
            ResolveFailure::ParseFailed { source_name, error } => {
                write!(f, "{} source failed: {}", source_name, error)
            }
        }
    }
}

/// Payload delivered to handlers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigatorEvent {
    /// Fired once at the end of `init`
    Loaded {
        /// Number of chapters loaded
        chapter_count: usize,
        /// Book metadata
        metadata: BookMetadata,
        /// Whether the book came from the online catalog
        is_online: bool,
    },
    /// Fired on every successful cursor move
    ChapterChanged {
        /// New cursor position
        index: usize,
        /// Chapter at the new position
        chapter: Chapter,
    },
    /// Fired for each recovered resolution failure, before falling back
    Error(ResolveFailure),
}

impl NavigatorEvent {
    /// Category of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            NavigatorEvent::Loaded { .. } => EventKind::Loaded,
            NavigatorEvent::ChapterChanged { .. } => EventKind::ChapterChanged,
            NavigatorEvent::Error(_) => EventKind::Error,
        }
    }
}

type Handler = Arc<dyn Fn(&NavigatorEvent) + Send + Sync>;

struct Registration {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Observer list owned by a single navigator
#[derive(Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&NavigatorEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.registrations.push(Registration {
            id,
            kind,
            handler: Arc::new(handler),
        });
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// cancel while being called; such changes apply to the next emit.
    pub fn emit(&self, event: &NavigatorEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .registry
            .lock()
            .registrations
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Arc::clone(&r.handler))
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry
            .lock()
            .registrations
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("handlers", &registry.registrations.len())
            .finish()
    }
}

/// Handle to a registered handler
#[must_use = "dropping a Subscription keeps the handler; call cancel() to remove it"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the handler. Returns false if it was already gone.
    pub fn cancel(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.lock();
        let before = registry.registrations.len();
        registry.registrations.retain(|r| r.id != self.id);
        registry.registrations.len() != before
    }
}
