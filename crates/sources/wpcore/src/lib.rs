//! # bStat WordPress Core Source
//!
//! Records WordPress core lifecycle occurrences as bStat footsteps under the
//! `wpcore` component:
//!
//! | hook | action | info |
//! |---|---|---|
//! | `user_register` | `newuser` | referring URL |
//! | `set_auth_cookie` | `userauth` | referring URL |
//! | `activated_plugin` / `deactivated_plugin` | `plugin` | verb, plugin file |
//! | `widget_update_callback` | `widget` | `update`, widget type, instance number |
//!
//! Widget deletions are not tracked.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bstat_source_wpcore::{PluginHook, WpCoreSource};
//!
//! let source = WpCoreSource::from_parts(store, context);
//! source.plugin(PluginHook::Activated, "akismet/akismet.php", 1).await?;
//! ```

mod event;
mod source;

pub use event::{PluginHook, WidgetRef, WpCoreEvent, plugin_verb};
pub use source::{COMPONENT, WpCoreSource};
