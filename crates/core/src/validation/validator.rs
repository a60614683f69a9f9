//! Rule evaluator -- pure logic, no I/O.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use validator::{ValidateEmail, ValidateUrl};

use super::rules::{Rule, RuleKind, ValidationError};

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

/// Decides whether a single value satisfies a single rule.
///
/// Implementations must be pure: the same `(value, rule)` pair always yields
/// the same outcome. The returned error has an empty `field`; the caller
/// attributes it.
pub trait Validator: Send + Sync {
    fn validate(&self, value: Option<&Value>, rule: &Rule) -> Result<(), ValidationError>;
}

/// The built-in evaluator covering every [`RuleKind`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleValidator;

impl Validator for RuleValidator {
    fn validate(&self, value: Option<&Value>, rule: &Rule) -> Result<(), ValidationError> {
        let value = value.filter(|v| !v.is_null());

        let passed = match rule.kind() {
            RuleKind::Equal => evaluate_equal(rule, value),
            RuleKind::Optional => true,
            RuleKind::MinLength => {
                text_length(value).is_some_and(|len| in_bounds(len as f64, rule.bound(0), None))
            }
            RuleKind::MaxLength => {
                text_length(value).is_some_and(|len| in_bounds(len as f64, None, rule.bound(0)))
            }
            RuleKind::Length => text_length(value)
                .is_some_and(|len| in_bounds(len as f64, rule.bound(0), rule.bound(1))),
            RuleKind::Email => value.and_then(Value::as_str).is_some_and(|s| s.validate_email()),
            RuleKind::Url => value.and_then(Value::as_str).is_some_and(|s| s.validate_url()),
            RuleKind::Regexp => evaluate_regexp(rule, value),
            RuleKind::Integer => value.is_some_and(is_integer),
            RuleKind::Numeric => value.is_some_and(|v| is_integer(v) || is_float(v)),
            RuleKind::Float => value.is_some_and(is_float),
            RuleKind::Range => {
                as_number(value).is_some_and(|n| in_bounds(n, rule.bound(0), rule.bound(1)))
            }
            RuleKind::Uuid => value
                .and_then(Value::as_str)
                .is_some_and(|s| UUID_RE.is_match(s)),
        };

        if passed {
            Ok(())
        } else {
            let message = rule
                .message()
                .map(str::to_owned)
                .unwrap_or_else(|| default_message(rule));
            Err(ValidationError::new(rule.kind(), message))
        }
    }
}

fn evaluate_equal(rule: &Rule, value: Option<&Value>) -> bool {
    let expected = rule.params().first().unwrap_or(&Value::Null);
    value.unwrap_or(&Value::Null) == expected
}

fn evaluate_regexp(rule: &Rule, value: Option<&Value>) -> bool {
    let (Some(text), Some(pattern)) = (as_text(value), rule.pattern()) else {
        return false;
    };
    pattern.is_match(&text)
}

fn in_bounds(n: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
}

/// Character count of a string value; other types have no length.
fn text_length(value: Option<&Value>) -> Option<usize> {
    value.and_then(Value::as_str).map(|s| s.chars().count())
}

/// Strings as-is and numbers in their JSON form.
fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings as `f64`.
fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

/// Whether the value survives conversion to `f64` without loss.
fn is_float(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (i as f64) as i64 == i && (i as f64) < 9.223_372_036_854_775_807e18
            } else if let Some(u) = n.as_u64() {
                (u as f64) < 1.844_674_407_370_955_2e19 && (u as f64) as u64 == u
            } else {
                n.as_f64().is_some_and(f64::is_finite)
            }
        }
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn default_message(rule: &Rule) -> String {
    let bound = |i: usize| rule.params().get(i).map(Value::to_string).unwrap_or_default();
    match rule.kind() {
        RuleKind::Equal => format!("Value must be equal to {}", bound(0)),
        RuleKind::Optional => "Value is optional".to_string(),
        RuleKind::MinLength => format!("Value must be at least {} characters long", bound(0)),
        RuleKind::MaxLength => format!("Value must be at most {} characters long", bound(0)),
        RuleKind::Length => format!(
            "Value must be between {} and {} characters long",
            bound(0),
            bound(1)
        ),
        RuleKind::Email => "Value must be a valid email address".to_string(),
        RuleKind::Url => "Value must be a valid URL".to_string(),
        RuleKind::Regexp => format!("Value must match pattern {}", bound(0)),
        RuleKind::Integer => "Value must be an integer".to_string(),
        RuleKind::Numeric => "Value must be numeric".to_string(),
        RuleKind::Float => "Value must be a float".to_string(),
        RuleKind::Range => format!(
            "Value must be a number between {} and {}",
            rule.bound(0).unwrap_or_default(),
            rule.bound(1).unwrap_or_default()
        ),
        RuleKind::Uuid => "Value must be a valid UUID".to_string(),
    }
}
