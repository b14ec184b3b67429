//! Collaborator traits for the footstep recorder.
//!
//! The recorder owns none of its collaborators. A host wires a
//! [`BackingStore`] and a [`ContextProvider`] into it explicitly, and event
//! sources describe themselves through [`EventSource`].

use async_trait::async_trait;

use crate::error::{ContextResult, StoreResult};
use crate::types::{FootstepRecord, RecordId};

/// Trait for append-only footstep storage.
///
/// Implementations must make `insert` all-or-nothing: a record is either
/// fully stored and its id returned, or an error is returned and nothing is
/// visible. The recorder never retries.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Appends a record and returns the identifier assigned to it.
    async fn insert(&self, record: &FootstepRecord) -> StoreResult<RecordId>;
}

/// Trait for reading ambient analytics context.
///
/// Reads are expected to be fast and side-effect free. The recorder bounds
/// each call with a timeout and treats any error as a missing value.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Identity of the site emitting the event.
    async fn site_identity(&self) -> ContextResult<u64>;

    /// Current session identifier.
    async fn session_id(&self) -> ContextResult<String>;

    /// Label assigned to the variation slot `key` (`"x1"`..`"x7"`), if any.
    async fn variation(&self, key: &str) -> ContextResult<Option<String>>;
}

/// Trait for integrations that turn host occurrences into raw events.
///
/// Implement this to declare which component name the integration records
/// under and which actions it produces.
pub trait EventSource {
    /// Component name written into every footstep from this source.
    fn component(&self) -> &str;

    /// Actions this source produces.
    fn provided_actions(&self) -> &'static [&'static str];
}
