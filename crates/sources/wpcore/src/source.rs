//! The WordPress core event source.

use std::sync::Arc;

use bstat_core::{
    BackingStore, ContextProvider, EventSource, FootstepRecorder, RecordError, RecordId,
    RecordResult, RecorderConfig, actions,
};
use tracing::warn;

use crate::event::{PluginHook, WidgetRef, WpCoreEvent};

/// Component name written into every footstep from this source.
pub const COMPONENT: &str = "wpcore";

const PROVIDED_ACTIONS: &[&str] = &[
    actions::PLUGIN,
    actions::NEW_USER,
    actions::USER_AUTH,
    actions::WIDGET,
];

/// Records WordPress core lifecycle occurrences as bStat footsteps.
///
/// Each method corresponds to one WordPress hook. The host calls it with the
/// hook's meaningful arguments plus the current user where the hook itself
/// does not carry one.
#[derive(Clone)]
pub struct WpCoreSource {
    recorder: FootstepRecorder,
}

impl WpCoreSource {
    /// Creates a source around an existing recorder.
    ///
    /// The recorder should be configured with the `wpcore` component.
    pub fn new(recorder: FootstepRecorder) -> Self {
        if recorder.component() != COMPONENT {
            warn!(
                component = recorder.component(),
                expected = COMPONENT,
                "WordPress core source is recording under a different component"
            );
        }
        Self { recorder }
    }

    /// Creates a source and its recorder from a store and context provider.
    pub fn from_parts(store: Arc<dyn BackingStore>, context: Arc<dyn ContextProvider>) -> Self {
        let recorder = FootstepRecorder::new(store, context)
            .with_config(RecorderConfig::for_component(COMPONENT));
        Self { recorder }
    }

    /// Returns the underlying recorder.
    pub fn recorder(&self) -> &FootstepRecorder {
        &self.recorder
    }

    /// Records a typed occurrence.
    ///
    /// Returns `Ok(None)` when the occurrence is not recordable (a
    /// registration without a user id).
    pub async fn dispatch(&self, event: WpCoreEvent) -> RecordResult<Option<RecordId>> {
        match event.into_raw() {
            Some(raw) => self.recorder.record(raw).await.map(Some),
            None => Ok(None),
        }
    }

    async fn record_required(&self, event: WpCoreEvent) -> RecordResult<RecordId> {
        self.dispatch(event)
            .await?
            .ok_or_else(|| RecordError::invalid("occurrence is not recordable"))
    }

    /// `user_register`: a new account was created.
    pub async fn user_register(
        &self,
        user_id: i64,
        referer: Option<&str>,
    ) -> RecordResult<Option<RecordId>> {
        self.dispatch(WpCoreEvent::UserRegistered {
            user_id,
            referer: referer.map(str::to_string),
        })
        .await
    }

    /// `set_auth_cookie`: a user signed in.
    pub async fn user_sign_in(&self, user_id: i64, referer: Option<&str>) -> RecordResult<RecordId> {
        self.record_required(WpCoreEvent::UserSignedIn {
            user_id,
            referer: referer.map(str::to_string),
        })
        .await
    }

    /// `activated_plugin` / `deactivated_plugin`.
    pub async fn plugin(
        &self,
        hook: PluginHook,
        plugin: &str,
        current_user: i64,
    ) -> RecordResult<RecordId> {
        self.plugin_hook(hook.hook_name(), plugin, current_user).await
    }

    /// Plugin toggle for hosts that only know the hook name.
    ///
    /// The verb is the hook name with `_plugin` removed.
    pub async fn plugin_hook(
        &self,
        hook_name: &str,
        plugin: &str,
        current_user: i64,
    ) -> RecordResult<RecordId> {
        self.record_required(WpCoreEvent::PluginToggled {
            hook: hook_name.to_string(),
            plugin: plugin.to_string(),
            user_id: current_user,
        })
        .await
    }

    /// `widget_update_callback`: a widget's settings were saved.
    ///
    /// This runs as a filter, so the widget instance is handed back
    /// unchanged whether or not recording succeeds. Returning anything else
    /// would make WordPress drop the widget's settings.
    pub async fn widget_update<T>(&self, instance: T, widget: &WidgetRef, current_user: i64) -> T {
        let event = WpCoreEvent::WidgetUpdated {
            widget: widget.clone(),
            user_id: current_user,
        };

        if let Err(err) = self.dispatch(event).await {
            warn!(
                id_base = %widget.id_base,
                number = widget.number,
                error = %err,
                "Failed to record widget update"
            );
        }

        instance
    }
}

impl EventSource for WpCoreSource {
    fn component(&self) -> &str {
        self.recorder.component()
    }

    fn provided_actions(&self) -> &'static [&'static str] {
        PROVIDED_ACTIONS
    }
}
