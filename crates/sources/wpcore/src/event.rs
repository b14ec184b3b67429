//! Typed WordPress core occurrences and their mapping to raw events.

use bstat_core::{RawEvent, actions};

/// Plugin lifecycle hooks observed by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginHook {
    /// `activated_plugin`
    Activated,
    /// `deactivated_plugin`
    Deactivated,
}

impl PluginHook {
    /// Returns the WordPress hook name.
    pub fn hook_name(&self) -> &'static str {
        match self {
            Self::Activated => "activated_plugin",
            Self::Deactivated => "deactivated_plugin",
        }
    }

    /// Parses a WordPress hook name.
    pub fn from_hook_name(name: &str) -> Option<Self> {
        match name {
            "activated_plugin" => Some(Self::Activated),
            "deactivated_plugin" => Some(Self::Deactivated),
            _ => None,
        }
    }

    /// Returns the verb recorded in the footstep info (`activated`, `deactivated`).
    pub fn verb(&self) -> String {
        plugin_verb(self.hook_name())
    }
}

/// Strips the `_plugin` suffix from a plugin hook name.
///
/// Every occurrence is removed, so hosts that fire custom hooks such as
/// `network_activated_plugin` still yield a readable verb.
pub fn plugin_verb(hook_name: &str) -> String {
    hook_name.replace("_plugin", "")
}

/// The widget a settings update applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRef {
    /// Widget type, e.g. `text` or `recent-posts`.
    pub id_base: String,
    /// Instance number within the widget type.
    pub number: u32,
}

impl WidgetRef {
    pub fn new(id_base: impl Into<String>, number: u32) -> Self {
        Self {
            id_base: id_base.into(),
            number,
        }
    }
}

/// A WordPress core occurrence worth recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WpCoreEvent {
    /// A user account was created.
    UserRegistered {
        user_id: i64,
        referer: Option<String>,
    },
    /// A user signed in and received an auth cookie.
    UserSignedIn {
        user_id: i64,
        referer: Option<String>,
    },
    /// A plugin was activated or deactivated. `hook` is the raw hook name.
    PluginToggled {
        hook: String,
        plugin: String,
        user_id: i64,
    },
    /// A widget's settings were saved.
    WidgetUpdated { widget: WidgetRef, user_id: i64 },
}

impl WpCoreEvent {
    /// Converts the occurrence into a raw event.
    ///
    /// Returns `None` for a registration without a user id, which WordPress
    /// can fire when account creation fails part way.
    pub fn into_raw(self) -> Option<RawEvent> {
        let raw = match self {
            Self::UserRegistered { user_id, referer } => {
                if user_id == 0 {
                    return None;
                }
                RawEvent::new(actions::NEW_USER)
                    .with_user(user_id)
                    .with_info([referer.unwrap_or_default()])
            }
            Self::UserSignedIn { user_id, referer } => RawEvent::new(actions::USER_AUTH)
                .with_user(user_id)
                .with_info([referer.unwrap_or_default()]),
            Self::PluginToggled {
                hook,
                plugin,
                user_id,
            } => RawEvent::new(actions::PLUGIN)
                .with_user(user_id)
                .with_info([plugin_verb(&hook), plugin]),
            Self::WidgetUpdated { widget, user_id } => RawEvent::new(actions::WIDGET)
                .with_user(user_id)
                .with_info(["update".to_string(), widget.id_base, widget.number.to_string()]),
        };

        Some(raw)
    }
}
