//! A named, ordered list of rules applied to one input value.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::rules::{Rule, RuleKind, ValidationError};
use super::validator::Validator;

pub struct Field {
    name: String,
    rules: Vec<Rule>,
    validator: Arc<dyn Validator>,
}

impl Field {
    pub fn new(name: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            validator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Append a rule; rules are evaluated in the order they were added.
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn is_optional(&self) -> bool {
        self.rules.iter().any(|r| r.kind() == RuleKind::Optional)
    }

    /// Evaluate every rule against `value` and collect one error per failure.
    ///
    /// An optional field with an empty value yields no errors at all.
    pub fn validate(&self, value: Option<&Value>) -> Vec<ValidationError> {
        if is_empty_value(value) && self.is_optional() {
            return Vec::new();
        }

        self.rules
            .iter()
            .filter_map(|rule| self.validator.validate(value, rule).err())
            .map(|err| err.with_field(&self.name))
            .collect()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// Absent, `null`, `""`, `[]` and `{}` all count as empty.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}
