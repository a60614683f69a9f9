//! Turns a resource into a built response for the negotiated content type.

use std::borrow::Cow;
use std::sync::Arc;

use super::builder::{ApiResponse, BuildContext};
use super::cache::{CacheValidator, EntityTagValidator};
use super::mapper::MapperContext;
use super::registry::ResponseRegistry;
use super::request::{RequestInfo, ResponseHead};
use crate::error::CoreError;
use crate::resource::{content_type, Resource};

pub const NOT_MODIFIED: u16 = 304;
pub const NO_CONTENT: u16 = 204;

pub struct ResponseFactory {
    registry: ResponseRegistry,
    mappers: MapperContext,
    cache_validator: Arc<dyn CacheValidator>,
}

impl Default for ResponseFactory {
    fn default() -> Self {
        Self::new(
            ResponseRegistry::default(),
            MapperContext::default(),
            Arc::new(EntityTagValidator),
        )
    }
}

impl ResponseFactory {
    pub fn new(
        registry: ResponseRegistry,
        mappers: MapperContext,
        cache_validator: Arc<dyn CacheValidator>,
    ) -> Self {
        Self {
            registry,
            mappers,
            cache_validator,
        }
    }

    pub fn registry(&self) -> &ResponseRegistry {
        &self.registry
    }

    pub fn mappers(&self) -> &MapperContext {
        &self.mappers
    }

    /// Register a built-in builder (`text`, `jsonp`, `file`, `null`) for a
    /// content type. Configuration time only.
    pub fn register_response(&mut self, mime_type: &str, kind: &str) -> Result<&mut Self, CoreError> {
        self.registry.register(mime_type, kind)?;
        Ok(self)
    }

    pub fn unregister_response(&mut self, mime_type: &str) {
        self.registry.unregister(mime_type);
    }

    pub fn mappers_mut(&mut self) -> &mut MapperContext {
        &mut self.mappers
    }

    pub fn registry_mut(&mut self) -> &mut ResponseRegistry {
        &mut self.registry
    }

    /// Negotiate and build the response for `resource`.
    ///
    /// JSONP requests force the JSONP content type. Resolution failures
    /// return [`CoreError::InvalidState`] before `head` is touched. After
    /// that the cache validator header is always set; a matching validator
    /// yields 304 with an empty response without running the builder, and
    /// empty data yields 204 but is still built.
    pub fn create(
        &self,
        resource: &Resource,
        code: Option<u16>,
        request: &RequestInfo,
        head: &mut ResponseHead,
    ) -> Result<ApiResponse, CoreError> {
        // The cache validator sees the representation actually sent.
        let resource = if request.is_jsonp() && resource.content_type() != content_type::JSONP {
            let mut forced = resource.clone();
            forced.set_content_type(content_type::JSONP);
            Cow::Owned(forced)
        } else {
            Cow::Borrowed(resource)
        };
        let resource = &*resource;
        let content_type = resource.content_type();

        let builder = self
            .registry
            .resolve(content_type)
            .ok_or_else(|| CoreError::InvalidState(format!("Unregistered API response: {content_type}")))?;
        let mapper = self.mappers.get_mapper(content_type)?;

        if let Some(code) = code {
            head.set_status(code);
        }

        head.set_header(
            self.cache_validator.name(),
            self.cache_validator.generate(resource),
        );
        if self.cache_validator.matches(resource, request) {
            tracing::debug!(content_type, "Cache validator matched, not modified");
            head.set_status(NOT_MODIFIED);
            return Ok(ApiResponse::null());
        }

        if resource.is_empty() {
            head.set_status(NO_CONTENT);
        }

        let context = BuildContext {
            jsonp_callback: request.jsonp_callback.as_deref(),
            status: head.status(),
        };
        let response = builder.build(resource.data(), mapper.as_ref(), content_type, &context)?;
        tracing::debug!(content_type, status = head.status(), "Built API response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::negotiation::builder::{ResponseBody, ResponseBuilder};
    use crate::negotiation::mapper::Mapper;

    struct FixedValidator {
        matches: bool,
    }

    impl CacheValidator for FixedValidator {
        fn name(&self) -> &str {
            "X-Version"
        }

        fn generate(&self, _resource: &Resource) -> String {
            "v1".into()
        }

        fn matches(&self, _resource: &Resource, _request: &RequestInfo) -> bool {
            self.matches
        }
    }

    #[derive(Debug, Default)]
    struct CountingBuilder {
        calls: AtomicUsize,
    }

    impl ResponseBuilder for CountingBuilder {
        fn build(
            &self,
            data: &Map<String, Value>,
            mapper: &dyn Mapper,
            content_type: &str,
            _context: &BuildContext<'_>,
        ) -> Result<ApiResponse, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ApiResponse {
                content_type: content_type.into(),
                body: ResponseBody::Text(mapper.stringify(data)?),
            })
        }
    }

    fn factory(matches: bool) -> (ResponseFactory, Arc<CountingBuilder>) {
        let builder = Arc::new(CountingBuilder::default());
        let mut registry = ResponseRegistry::default();
        registry.register_builder(content_type::JSON, builder.clone());
        let factory = ResponseFactory::new(
            registry,
            MapperContext::default(),
            Arc::new(FixedValidator { matches }),
        );
        (factory, builder)
    }

    fn resource(data: Value) -> Resource {
        Resource::from_serialize(content_type::JSON, &data).unwrap()
    }

    #[test]
    fn builds_with_validator_header() {
        let (factory, builder) = factory(false);
        let mut head = ResponseHead::default();
        let response = factory
            .create(&resource(json!({"id": 1})), None, &RequestInfo::default(), &mut head)
            .unwrap();

        assert_eq!(head.status(), 200);
        assert_eq!(head.header("X-Version"), Some("v1"));
        assert_eq!(response.body, ResponseBody::Text(r#"{"id":1}"#.into()));
        assert_eq!(builder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_match_short_circuits_with_304() {
        let (factory, builder) = factory(true);
        let mut head = ResponseHead::default();
        let response = factory
            .create(&resource(json!({"id": 1})), Some(201), &RequestInfo::default(), &mut head)
            .unwrap();

        assert_eq!(head.status(), 304);
        assert_eq!(head.header("X-Version"), Some("v1"));
        assert!(response.is_empty());
        assert_eq!(builder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_data_sets_204_and_still_builds() {
        let (factory, builder) = factory(false);
        let mut head = ResponseHead::default();
        factory
            .create(&resource(json!({})), None, &RequestInfo::default(), &mut head)
            .unwrap();

        assert_eq!(head.status(), 204);
        assert_eq!(builder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_data_builds_for_every_default_type() {
        let factory = ResponseFactory::default();
        for mime in [
            content_type::JSON,
            content_type::QUERY,
            content_type::XML,
            content_type::DATA_URL,
            content_type::FILE,
            content_type::NULL,
        ] {
            let mut head = ResponseHead::default();
            let result = factory.create(&Resource::new(mime), None, &RequestInfo::default(), &mut head);
            assert!(result.is_ok(), "{mime}: {result:?}");
            assert_eq!(head.status(), 204, "{mime}");
        }

        let jsonp = RequestInfo {
            jsonp_callback: Some("cb".into()),
            ..RequestInfo::default()
        };
        let mut head = ResponseHead::default();
        let response = factory
            .create(&Resource::new(content_type::JSONP), None, &jsonp, &mut head)
            .unwrap();
        assert_eq!(head.status(), 204);
        assert_eq!(response.body, ResponseBody::Text(r#"cb({"response":{},"status":204});"#.into()));
    }

    #[test]
    fn unregistered_type_fails_without_touching_head() {
        let (factory, builder) = factory(false);
        let mut head = ResponseHead::default();
        let mut res = resource(json!({"id": 1}));
        res.set_content_type("text/csv");

        let result = factory.create(&res, Some(201), &RequestInfo::default(), &mut head);

        assert_matches!(result, Err(CoreError::InvalidState(_)));
        assert_eq!(head, ResponseHead::default());
        assert_eq!(builder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn registered_type_without_mapper_is_invalid_state() {
        let (mut factory, _) = factory(false);
        factory.register_response("text/csv", "text").unwrap();
        let mut res = resource(json!({"id": 1}));
        res.set_content_type("text/csv");

        let result = factory.create(&res, None, &RequestInfo::default(), &mut ResponseHead::default());
        assert_matches!(result, Err(CoreError::InvalidState(_)));
    }

    #[test]
    fn jsonp_request_forces_jsonp_type() {
        let factory = ResponseFactory::default();
        let request = RequestInfo {
            jsonp_callback: Some("cb".into()),
            ..RequestInfo::default()
        };
        let mut head = ResponseHead::default();
        let response = factory
            .create(&resource(json!({"id": 1})), Some(201), &request, &mut head)
            .unwrap();

        assert_eq!(response.content_type, content_type::JSONP);
        assert_eq!(
            response.body,
            ResponseBody::Text(r#"cb({"response":{"id":1},"status":201});"#.into())
        );
        let mut json_head = ResponseHead::default();
        factory
            .create(&resource(json!({"id": 1})), Some(201), &RequestInfo::default(), &mut json_head)
            .unwrap();
        assert!(head.header("ETag").is_some());
        assert_ne!(head.header("ETag"), json_head.header("ETag"));
    }

    #[test]
    fn caller_code_is_applied() {
        let factory = ResponseFactory::default();
        let mut head = ResponseHead::default();
        factory
            .create(&resource(json!({"id": 1})), Some(201), &RequestInfo::default(), &mut head)
            .unwrap();
        assert_eq!(head.status(), 201);
    }
}
