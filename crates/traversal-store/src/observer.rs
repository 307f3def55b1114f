//! The optional incremental-reader feed (§4.3 "an observer feed suitable
//! for incremental readers"; §9 "Event publishing").
//!
//! An observer is invoked after every durable append. It is best-effort:
//! a slow or failing observer must never block or fail the write it is
//! reacting to, so [`TraversalStore`](crate::store::TraversalStore) logs
//! and drops observer errors rather than propagating them.

use soulbrowser_core_types::{ActionKey, BrainStateId, TraversalStatus};

/// One notification the store emits after a durable mutation.
#[derive(Debug, Clone)]
pub enum TraversalEvent {
    Started,
    BrainStateAppended(BrainStateId),
    ActionAppended(ActionKey),
    ExtractedDataSet,
    Sealed(TraversalStatus),
}

/// Best-effort observer of traversal progress. Implementations should
/// not perform blocking I/O; the platform UI poller is expected to be
/// the typical consumer.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: TraversalEvent);
}

/// An observer that does nothing, used when no caller-supplied observer
/// is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: TraversalEvent) {}
}
