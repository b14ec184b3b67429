//! Static context provider.

use async_trait::async_trait;
use bstat_core::{ContextError, ContextProvider, ContextResult};
use std::collections::HashMap;

/// A [`ContextProvider`] that returns fixed values.
///
/// Useful for tests and for hosts that know their site and session up front.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    blog: u64,
    session: String,
    variations: HashMap<String, String>,
    failing: bool,
}

impl StaticContext {
    /// Creates a context with the given site identity and session.
    pub fn new(blog: u64, session: impl Into<String>) -> Self {
        Self {
            blog,
            session: session.into(),
            variations: HashMap::new(),
            failing: false,
        }
    }

    /// Creates a context whose every read fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Sets the label for a variation slot.
    pub fn with_variation(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.variations.insert(key.into(), label.into());
        self
    }

    /// Sets labels for several variation slots.
    pub fn with_variations<I, K, V>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.variations
            .extend(variations.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    fn check(&self) -> ContextResult<()> {
        if self.failing {
            return Err(ContextError::unavailable("static context configured to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContextProvider for StaticContext {
    async fn site_identity(&self) -> ContextResult<u64> {
        self.check()?;
        Ok(self.blog)
    }

    async fn session_id(&self) -> ContextResult<String> {
        self.check()?;
        Ok(self.session.clone())
    }

    async fn variation(&self, key: &str) -> ContextResult<Option<String>> {
        self.check()?;
        Ok(self.variations.get(key).cloned())
    }
}
