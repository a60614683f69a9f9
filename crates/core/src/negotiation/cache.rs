//! Cache validators decide whether the client's cached copy is still fresh.

use crate::hashing::entity_tag;
use crate::resource::Resource;

use super::request::RequestInfo;

pub trait CacheValidator: Send + Sync {
    /// Response header carrying the validator token.
    fn name(&self) -> &str;

    fn generate(&self, resource: &Resource) -> String;

    /// Whether the token the client sent still matches `resource`.
    fn matches(&self, resource: &Resource, request: &RequestInfo) -> bool;
}

/// Strong `ETag` over the content type and compact JSON encoding of the data.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityTagValidator;

impl CacheValidator for EntityTagValidator {
    fn name(&self) -> &str {
        "ETag"
    }

    fn generate(&self, resource: &Resource) -> String {
        let content_type = resource.content_type().to_ascii_lowercase();
        let data = serde_json::to_vec(resource.data()).unwrap_or_default();
        entity_tag([content_type.as_bytes(), data.as_slice()])
    }

    fn matches(&self, resource: &Resource, request: &RequestInfo) -> bool {
        let Some(header) = request.if_none_match.as_deref() else {
            return false;
        };
        let tag = self.generate(resource);
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == tag
        })
    }
}
