//! Content type -> response builder mapping.
//!
//! Mutated only while the application is being configured; request handling
//! reads it through a shared reference.

use std::collections::HashMap;
use std::sync::Arc;

use super::builder::{ResponseBuilder, ResponseKind};
use crate::error::CoreError;
use crate::resource::content_type;

/// Builders keyed by lowercase content type.
///
/// Each key holds a stack: registering over an existing type shadows it, and
/// unregistering pops back to whatever was there before.
#[derive(Debug, Clone)]
pub struct ResponseRegistry {
    builders: HashMap<String, Vec<Arc<dyn ResponseBuilder>>>,
}

impl Default for ResponseRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (mime, kind) in [
            (content_type::JSON, ResponseKind::Text),
            (content_type::JSONP, ResponseKind::Jsonp),
            (content_type::QUERY, ResponseKind::Text),
            (content_type::XML, ResponseKind::Text),
            (content_type::DATA_URL, ResponseKind::Text),
            (content_type::FILE, ResponseKind::File),
            (content_type::NULL, ResponseKind::Null),
        ] {
            registry.register_builder(mime, kind.builder());
        }
        registry
    }
}

impl ResponseRegistry {
    /// A registry without the built-in mappings.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register a built-in builder by name (`text`, `jsonp`, `file`, `null`).
    ///
    /// Fails with [`CoreError::InvalidArgument`] for unknown names.
    pub fn register(&mut self, content_type: &str, kind: &str) -> Result<&mut Self, CoreError> {
        let kind: ResponseKind = kind.parse()?;
        Ok(self.register_builder(content_type, kind.builder()))
    }

    pub fn register_builder(
        &mut self,
        content_type: &str,
        builder: Arc<dyn ResponseBuilder>,
    ) -> &mut Self {
        tracing::debug!(content_type, "Registering response builder");
        self.builders
            .entry(content_type.to_ascii_lowercase())
            .or_default()
            .push(builder);
        self
    }

    /// Remove the most recent registration for `content_type`.
    pub fn unregister(&mut self, content_type: &str) {
        let key = content_type.to_ascii_lowercase();
        if let Some(stack) = self.builders.get_mut(&key) {
            stack.pop();
            if stack.is_empty() {
                self.builders.remove(&key);
            }
            tracing::debug!(content_type, "Unregistered response builder");
        }
    }

    pub fn resolve(&self, content_type: &str) -> Option<Arc<dyn ResponseBuilder>> {
        self.builders
            .get(&content_type.to_ascii_lowercase())
            .and_then(|stack| stack.last())
            .cloned()
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.builders.contains_key(&content_type.to_ascii_lowercase())
    }

    /// Registered, and the builder renders arbitrary data without extra
    /// request context (so not JSONP, file or null).
    pub fn is_negotiable(&self, content_type: &str) -> bool {
        self.resolve(content_type).is_some_and(|builder| builder.negotiable())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn default_registry_covers_builtin_types() {
        let registry = ResponseRegistry::default();
        for mime in [
            content_type::JSON,
            content_type::JSONP,
            content_type::QUERY,
            content_type::XML,
            content_type::DATA_URL,
            content_type::FILE,
            content_type::NULL,
        ] {
            assert!(registry.resolve(mime).is_some(), "{mime} should resolve");
        }
        assert!(registry.resolve("text/csv").is_none());
        assert!(registry.contains("APPLICATION/JSON"));
    }

    #[test]
    fn only_data_rendering_builders_are_negotiable() {
        let mut registry = ResponseRegistry::default();
        assert!(registry.is_negotiable(content_type::JSON));
        assert!(registry.is_negotiable(content_type::XML));
        assert!(!registry.is_negotiable(content_type::JSONP));
        assert!(!registry.is_negotiable(content_type::FILE));
        assert!(!registry.is_negotiable(content_type::NULL));
        assert!(!registry.is_negotiable("application/pdf"));

        registry.register("application/pdf", "file").unwrap();
        assert!(!registry.is_negotiable("application/pdf"));
    }

    #[test]
    fn register_rejects_unknown_builder_names() {
        let mut registry = ResponseRegistry::empty();
        assert_matches!(
            registry.register("text/csv", "spreadsheet"),
            Err(CoreError::InvalidArgument(_))
        );
        assert!(registry.resolve("text/csv").is_none());
    }

    #[test]
    fn unregister_restores_previous_resolution() {
        let mut registry = ResponseRegistry::default();

        registry.register("text/csv", "text").unwrap();
        assert!(registry.resolve("text/csv").is_some());
        registry.unregister("text/csv");
        assert!(registry.resolve("text/csv").is_none());

        let original = registry.resolve(content_type::JSON).unwrap();
        registry.register(content_type::JSON, "null").unwrap();
        let shadow = registry.resolve(content_type::JSON).unwrap();
        assert!(!Arc::ptr_eq(&original, &shadow));
        registry.unregister(content_type::JSON);
        assert!(Arc::ptr_eq(
            &original,
            &registry.resolve(content_type::JSON).unwrap()
        ));

        registry.unregister(content_type::JSON);
        assert!(registry.resolve(content_type::JSON).is_none());
    }
}
