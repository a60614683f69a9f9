//! Request input paired with the validation scope declared for it.

use serde_json::{Map, Value};

use super::field::Field;
use super::rules::ValidationError;
use super::scope::ValidationScope;

/// Parsed request data (query merged with body) plus its validation rules.
#[derive(Default)]
pub struct Input {
    data: Map<String, Value>,
    scope: ValidationScope,
}

impl Input {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            scope: ValidationScope::default(),
        }
    }

    pub fn with_scope(data: Map<String, Value>, scope: ValidationScope) -> Self {
        Self { data, scope }
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Declare rules for `name`; see [`ValidationScope::field`].
    pub fn field(&mut self, name: &str) -> &mut Field {
        self.scope.field(name)
    }

    pub fn scope(&self) -> &ValidationScope {
        &self.scope
    }

    /// Whether any field rules were declared.
    pub fn has_rules(&self) -> bool {
        !self.scope.is_empty()
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        self.scope.validate(&self.data)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
