//! Core data types for bStat footsteps.
//!
//! A [`RawEvent`] is what an event source hands to the recorder. A
//! [`FootstepRecord`] is what the recorder hands to the backing store: the raw
//! event plus site, session, variation and time context. Records are built
//! only by the recorder and expose read-only accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a stored footstep by the backing store.
pub type RecordId = uuid::Uuid;

/// Legacy discriminator carried by every footstep.
pub const POST_DISCRIMINATOR: u32 = 1;

/// Separator used when flattening [`RawEvent::info`] into [`FootstepRecord::info`].
pub const INFO_SEPARATOR: &str = "|";

/// The experiment variation slots resolved for every footstep, in order.
pub const VARIATION_KEYS: [&str; 7] = ["x1", "x2", "x3", "x4", "x5", "x6", "x7"];

/// Well-known action tags.
///
/// The action set is open: any non-empty string is accepted by the recorder
/// unless an allow-list is configured.
pub mod actions {
    /// A plugin was activated or deactivated.
    pub const PLUGIN: &str = "plugin";
    /// A user account was created.
    pub const NEW_USER: &str = "newuser";
    /// A user signed in.
    pub const USER_AUTH: &str = "userauth";
    /// A widget's settings were saved.
    pub const WIDGET: &str = "widget";
}

/// A normalized event produced by an event source.
///
/// # Example
///
/// ```rust
/// use bstat_core::RawEvent;
///
/// let event = RawEvent::new("widget")
///     .with_user(7)
///     .with_info(["update", "text", "2"]);
/// assert_eq!(event.joined_info(), "update|text|2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Action tag (e.g. `plugin`, `newuser`).
    pub action: String,

    /// Acting account. Absent or `0` means no authenticated user.
    ///
    /// Signed so that malformed negative input from untyped hosts can be
    /// rejected instead of wrapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Free-form fragments interpreted only by downstream consumers.
    #[serde(default)]
    pub info: Vec<String>,
}

impl RawEvent {
    /// Creates an anonymous event with no info fragments.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            user_id: None,
            info: Vec::new(),
        }
    }

    /// Sets the acting user.
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Replaces the info fragments.
    pub fn with_info<I, S>(mut self, info: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info = info.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a single info fragment.
    pub fn push_info(mut self, fragment: impl Into<String>) -> Self {
        self.info.push(fragment.into());
        self
    }

    /// Returns the info fragments joined with `|`.
    ///
    /// Fragments are not escaped; a fragment containing `|` is
    /// indistinguishable from two fragments once joined.
    pub fn joined_info(&self) -> String {
        self.info.join(INFO_SEPARATOR)
    }

    /// Returns the acting user if one is authenticated.
    ///
    /// `None` for absent and zero ids. Negative ids also map to `None`; the
    /// recorder rejects them before this is consulted.
    pub fn authenticated_user(&self) -> Option<u64> {
        match self.user_id {
            Some(id) if id > 0 => Some(id as u64),
            _ => None,
        }
    }
}

/// The seven experiment variation labels attached to a footstep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variations {
    pub x1: Option<String>,
    pub x2: Option<String>,
    pub x3: Option<String>,
    pub x4: Option<String>,
    pub x5: Option<String>,
    pub x6: Option<String>,
    pub x7: Option<String>,
}

impl Variations {
    /// Builds variations from labels ordered as [`VARIATION_KEYS`].
    pub fn from_slots(slots: [Option<String>; 7]) -> Self {
        let [x1, x2, x3, x4, x5, x6, x7] = slots;
        Self { x1, x2, x3, x4, x5, x6, x7 }
    }

    /// Returns the label for a slot key (`"x1"`..`"x7"`).
    pub fn get(&self, key: &str) -> Option<&str> {
        let slot = match key {
            "x1" => &self.x1,
            "x2" => &self.x2,
            "x3" => &self.x3,
            "x4" => &self.x4,
            "x5" => &self.x5,
            "x6" => &self.x6,
            "x7" => &self.x7,
            _ => return None,
        };
        slot.as_deref()
    }
}

/// The durable, write-once unit appended to the backing store.
///
/// Serializes to a flat object with the fields `post`, `blog`, `user`,
/// `x1`..`x7`, `component`, `action`, `timestamp`, `session` and `info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootstepRecord {
    post: u32,
    blog: Option<u64>,
    user: Option<u64>,
    #[serde(flatten)]
    variations: Variations,
    component: String,
    action: String,
    timestamp: i64,
    session: String,
    info: String,
}

impl FootstepRecord {
    pub(crate) fn new(
        raw: &RawEvent,
        component: &str,
        context: ResolvedContext,
        timestamp: i64,
    ) -> Self {
        Self {
            post: POST_DISCRIMINATOR,
            blog: context.blog,
            user: raw.authenticated_user(),
            variations: context.variations,
            component: component.to_string(),
            action: raw.action.clone(),
            timestamp,
            session: context.session,
            info: raw.joined_info(),
        }
    }

    /// Legacy discriminator, always `1`.
    pub fn post(&self) -> u32 {
        self.post
    }

    /// Site identity, or `None` if it could not be resolved.
    pub fn blog(&self) -> Option<u64> {
        self.blog
    }

    /// Authenticated user, or `None` for anonymous events.
    pub fn user(&self) -> Option<u64> {
        self.user
    }

    /// All seven variation labels.
    pub fn variations(&self) -> &Variations {
        &self.variations
    }

    /// Label for a single variation slot.
    pub fn variation(&self, key: &str) -> Option<&str> {
        self.variations.get(key)
    }

    /// Integration that produced the event.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Action tag copied from the raw event.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// UTC Unix epoch seconds captured when the record was built.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Session identifier, empty if it could not be resolved.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Info fragments joined with `|`.
    pub fn info(&self) -> &str {
        &self.info
    }
}

/// Ambient values read from the context provider for one record.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedContext {
    pub blog: Option<u64>,
    pub session: String,
    pub variations: Variations,
}

/// A footstep together with its storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFootstep {
    /// Identifier assigned by the store.
    pub id: RecordId,

    /// The stored record.
    pub record: FootstepRecord,

    /// When the store accepted the record.
    pub stored_at: DateTime<Utc>,
}

impl StoredFootstep {
    /// Wraps a record with a fresh identifier and the current time.
    pub fn new(record: FootstepRecord) -> Self {
        Self {
            id: RecordId::new_v4(),
            record,
            stored_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(raw: &RawEvent) -> FootstepRecord {
        let context = ResolvedContext {
            blog: Some(3),
            session: "sess-1".to_string(),
            variations: Variations {
                x2: Some("b".to_string()),
                ..Default::default()
            },
        };
        FootstepRecord::new(raw, "wpcore", context, 1_700_000_000)
    }

    #[test]
    fn test_info_join() {
        let event = RawEvent::new("widget").with_info(["update", "text", "2"]);
        assert_eq!(event.joined_info(), "update|text|2");

        let empty = RawEvent::new("widget");
        assert_eq!(empty.joined_info(), "");
    }

    #[test]
    fn test_info_fragments_are_not_escaped() {
        let event = RawEvent::new("plugin").with_info(["a|b", "c"]);
        assert_eq!(event.joined_info(), "a|b|c");
    }

    #[test]
    fn test_authenticated_user() {
        assert_eq!(RawEvent::new("x").authenticated_user(), None);
        assert_eq!(RawEvent::new("x").with_user(0).authenticated_user(), None);
        assert_eq!(RawEvent::new("x").with_user(42).authenticated_user(), Some(42));
    }

    #[test]
    fn test_raw_event_from_json_defaults() {
        let event: RawEvent = serde_json::from_str(r#"{"action":"newuser"}"#).unwrap();
        assert_eq!(event.action, "newuser");
        assert_eq!(event.user_id, None);
        assert!(event.info.is_empty());
    }

    #[test]
    fn test_variations_lookup() {
        let variations = Variations::from_slots([
            Some("a".into()),
            None,
            None,
            None,
            None,
            None,
            Some("g".into()),
        ]);
        assert_eq!(variations.get("x1"), Some("a"));
        assert_eq!(variations.get("x2"), None);
        assert_eq!(variations.get("x7"), Some("g"));
        assert_eq!(variations.get("x8"), None);
    }

    #[test]
    fn test_record_serializes_flat() {
        let raw = RawEvent::new("widget")
            .with_user(9)
            .with_info(["update", "text", "2"]);
        let record = sample_record(&raw);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["post"], 1);
        assert_eq!(value["blog"], 3);
        assert_eq!(value["user"], 9);
        assert_eq!(value["x1"], serde_json::Value::Null);
        assert_eq!(value["x2"], "b");
        assert_eq!(value["component"], "wpcore");
        assert_eq!(value["action"], "widget");
        assert_eq!(value["timestamp"], 1_700_000_000i64);
        assert_eq!(value["session"], "sess-1");
        assert_eq!(value["info"], "update|text|2");
        assert!(value.get("variations").is_none());
    }

    #[test]
    fn test_anonymous_record_has_no_user() {
        let record = sample_record(&RawEvent::new("plugin").with_user(0));
        assert_eq!(record.user(), None);
        assert_eq!(record.post(), POST_DISCRIMINATOR);
    }
}
