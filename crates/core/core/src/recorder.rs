//! The footstep recorder.
//!
//! `FootstepRecorder::record` is the single entry point: validate the raw
//! event, read ambient context, stamp it with the current UTC epoch second,
//! and append one record to the backing store.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::RecorderConfig;
use crate::error::{ContextError, ContextResult, RecordError, RecordResult};
use crate::traits::{BackingStore, ContextProvider};
use crate::types::{FootstepRecord, RawEvent, RecordId, ResolvedContext, VARIATION_KEYS, Variations};

/// Returns the current time as UTC Unix epoch seconds.
///
/// Epoch seconds carry no zone, so this reads no timezone setting and
/// changes none.
pub fn utc_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Enriches raw events and appends them to a backing store.
///
/// The recorder keeps no state between calls. Clones share the same store
/// and context provider.
#[derive(Clone)]
pub struct FootstepRecorder {
    store: Arc<dyn BackingStore>,
    context: Arc<dyn ContextProvider>,
    config: RecorderConfig,
}

impl FootstepRecorder {
    /// Creates a recorder with the default configuration.
    pub fn new(store: Arc<dyn BackingStore>, context: Arc<dyn ContextProvider>) -> Self {
        Self {
            store,
            context,
            config: RecorderConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Returns the component name written into every footstep.
    pub fn component(&self) -> &str {
        &self.config.component
    }

    /// Records one raw event and returns the identifier the store assigned.
    ///
    /// Validation failures return [`RecordError::InvalidEvent`] before any
    /// context read or write. Store failures are returned as
    /// [`RecordError::StoreFailure`] without retry; calling again records a
    /// second, distinct footstep.
    ///
    /// Dropping the returned future before the store insert starts writes
    /// nothing.
    pub async fn record(&self, raw: RawEvent) -> RecordResult<RecordId> {
        let record = self.footstep(&raw).await?;

        let id = self.store.insert(&record).await.map_err(|err| {
            debug!(
                action = record.action(),
                component = record.component(),
                error = %err,
                "Footstep insert failed"
            );
            RecordError::StoreFailure(err)
        })?;

        debug!(
            record_id = %id,
            action = record.action(),
            component = record.component(),
            user = ?record.user(),
            "Footstep recorded"
        );

        Ok(id)
    }

    /// Builds the footstep for `raw` without writing it.
    pub async fn footstep(&self, raw: &RawEvent) -> RecordResult<FootstepRecord> {
        self.validate(raw)?;

        let context = self.resolve_context().await;
        let timestamp = utc_epoch_seconds();

        Ok(FootstepRecord::new(raw, &self.config.component, context, timestamp))
    }

    fn validate(&self, raw: &RawEvent) -> RecordResult<()> {
        if raw.action.trim().is_empty() {
            return Err(RecordError::invalid("action must not be empty"));
        }

        if let Some(user_id) = raw.user_id {
            if user_id < 0 {
                return Err(RecordError::invalid(format!(
                    "user_id must not be negative, got {user_id}"
                )));
            }
        }

        if !self.config.accepts_action(&raw.action) {
            return Err(RecordError::invalid(format!(
                "action '{}' is not in the allowed list",
                raw.action
            )));
        }

        Ok(())
    }

    async fn resolve_context(&self) -> ResolvedContext {
        let blog = self.bounded("blog", self.context.site_identity()).await;
        let session = self
            .bounded("session", self.context.session_id())
            .await
            .unwrap_or_default();

        let mut slots: [Option<String>; 7] = Default::default();
        for (slot, key) in slots.iter_mut().zip(VARIATION_KEYS) {
            *slot = self.bounded(key, self.context.variation(key)).await.flatten();
        }

        ResolvedContext {
            blog,
            session,
            variations: Variations::from_slots(slots),
        }
    }

    /// Runs one context read under the configured timeout, degrading to `None`.
    async fn bounded<T>(
        &self,
        field: &'static str,
        read: impl Future<Output = ContextResult<T>>,
    ) -> Option<T> {
        let outcome = match tokio::time::timeout(self.config.context_timeout(), read).await {
            Ok(result) => result,
            Err(_) => Err(ContextError::Timeout),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(field, error = %err, "Context read failed, recording without it");
                None
            }
        }
    }
}
