//! A named collection of fields validated together against one input map.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::field::Field;
use super::rules::ValidationError;
use super::validator::{RuleValidator, Validator};

/// Fields keyed by name, kept in the order they were first referenced.
pub struct ValidationScope {
    validator: Arc<dyn Validator>,
    fields: IndexMap<String, Field>,
}

impl Default for ValidationScope {
    fn default() -> Self {
        Self::new(Arc::new(RuleValidator))
    }
}

impl ValidationScope {
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self {
            validator,
            fields: IndexMap::new(),
        }
    }

    /// Get the field called `name`, creating it on first reference.
    pub fn field(&mut self, name: &str) -> &mut Field {
        let validator = Arc::clone(&self.validator);
        self.fields
            .entry(name.to_owned())
            .or_insert_with(|| Field::new(name, validator))
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate every field against `data`.
    ///
    /// Errors are concatenated in field order; nothing is merged or dropped.
    /// Missing keys are validated as absent values.
    pub fn validate(&self, data: &Map<String, Value>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for field in self.fields.values() {
            errors.extend(field.validate(data.get(field.name())));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validation::rules::{Rule, RuleKind};

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn age_scope() -> ValidationScope {
        let mut scope = ValidationScope::default();
        scope
            .field("age")
            .add_rule(Rule::numeric())
            .add_rule(Rule::range(0, 120).unwrap());
        scope
    }

    #[test]
    fn field_lookup_is_idempotent() {
        let mut scope = ValidationScope::default();
        scope.field("name").add_rule(Rule::min_length(2));
        scope.field("name").add_rule(Rule::max_length(5));
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.field("name").rules().len(), 2);
    }

    #[test]
    fn age_scenarios() {
        let scope = age_scope();

        let errors = scope.validate(&data(json!({"age": "abc"})));
        let kinds: Vec<_> = errors.iter().map(|e| e.rule).collect();
        assert_eq!(kinds, vec![RuleKind::Numeric, RuleKind::Range]);

        let errors = scope.validate(&data(json!({"age": 200})));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, RuleKind::Range);

        assert!(scope.validate(&data(json!({"age": 30}))).is_empty());
    }

    #[test]
    fn errors_from_all_fields_are_concatenated_in_declaration_order() {
        let mut scope = ValidationScope::default();
        scope.field("name").add_rule(Rule::min_length(3));
        scope.field("email").add_rule(Rule::email());
        scope.field("age").add_rule(Rule::integer());

        let errors = scope.validate(&data(json!({
            "age": "x",
            "email": "nope",
            "name": "a"
        })));

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "age"]);
    }

    #[test]
    fn missing_keys_are_validated_as_absent() {
        let mut scope = ValidationScope::default();
        scope.field("token").add_rule(Rule::uuid());
        scope
            .field("note")
            .add_rule(Rule::optional())
            .add_rule(Rule::max_length(3));

        let errors = scope.validate(&Map::new());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "token");
    }
}
