//! Rule descriptors and validation error types.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// The constraint a [`Rule`] expresses.
///
/// Serializes as a snake_case token (`min_length`, `uuid`, ...) so rules can
/// be declared from configuration or schema files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Equal,
    Optional,
    MinLength,
    MaxLength,
    Length,
    Email,
    Url,
    Regexp,
    Integer,
    Numeric,
    Float,
    Range,
    Uuid,
}

impl RuleKind {
    pub const ALL: [RuleKind; 13] = [
        RuleKind::Equal,
        RuleKind::Optional,
        RuleKind::MinLength,
        RuleKind::MaxLength,
        RuleKind::Length,
        RuleKind::Email,
        RuleKind::Url,
        RuleKind::Regexp,
        RuleKind::Integer,
        RuleKind::Numeric,
        RuleKind::Float,
        RuleKind::Range,
        RuleKind::Uuid,
    ];

    /// The wire token for this kind.
    pub fn token(self) -> &'static str {
        match self {
            RuleKind::Equal => "equal",
            RuleKind::Optional => "optional",
            RuleKind::MinLength => "min_length",
            RuleKind::MaxLength => "max_length",
            RuleKind::Length => "length",
            RuleKind::Email => "email",
            RuleKind::Url => "url",
            RuleKind::Regexp => "regexp",
            RuleKind::Integer => "integer",
            RuleKind::Numeric => "numeric",
            RuleKind::Float => "float",
            RuleKind::Range => "range",
            RuleKind::Uuid => "uuid",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RuleKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.token() == s)
            .ok_or_else(|| CoreError::InvalidArgument(format!("Unknown rule kind: {s}")))
    }
}

/// An immutable validation constraint: a kind plus its ordered parameters.
///
/// Parametrized rules are built through the fallible constructors
/// ([`Rule::length`], [`Rule::range`], [`Rule::regexp`]) or
/// [`Rule::from_parts`], which check arity and bound ordering up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    kind: RuleKind,
    params: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    /// Compiled form of a `regexp` pattern.
    #[serde(skip)]
    pattern: Option<Regex>,
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.params == other.params && self.message == other.message
    }
}

#[derive(Deserialize)]
struct RawRule {
    kind: RuleKind,
    #[serde(default)]
    params: Vec<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<RawRule> for Rule {
    type Error = CoreError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let rule = Rule::from_parts(raw.kind, raw.params)?;
        Ok(match raw.message {
            Some(message) => rule.with_message(message),
            None => rule,
        })
    }
}

impl Rule {
    fn bare(kind: RuleKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
            message: None,
            pattern: None,
        }
    }

    /// Build a rule from a kind and raw parameters, checking both.
    pub fn from_parts(kind: RuleKind, params: Vec<Value>) -> Result<Self, CoreError> {
        let arity = match kind {
            RuleKind::Equal | RuleKind::MinLength | RuleKind::MaxLength | RuleKind::Regexp => 1,
            RuleKind::Length | RuleKind::Range => 2,
            _ => 0,
        };
        if params.len() != arity {
            return Err(CoreError::InvalidArgument(format!(
                "Rule '{kind}' expects {arity} parameter(s), got {}",
                params.len()
            )));
        }

        let mut compiled = None;
        match kind {
            RuleKind::MinLength | RuleKind::MaxLength | RuleKind::Length => {
                if params.iter().any(|p| p.as_u64().is_none()) {
                    return Err(CoreError::InvalidArgument(format!(
                        "Rule '{kind}' bounds must be non-negative integers"
                    )));
                }
            }
            RuleKind::Range => {
                if params.iter().any(|p| p.as_f64().is_none()) {
                    return Err(CoreError::InvalidArgument(
                        "Rule 'range' bounds must be numbers".into(),
                    ));
                }
            }
            RuleKind::Regexp => {
                let pattern = params[0].as_str().ok_or_else(|| {
                    CoreError::InvalidArgument("Rule 'regexp' pattern must be a string".into())
                })?;
                compiled = Some(Regex::new(pattern).map_err(|e| {
                    CoreError::InvalidArgument(format!("Invalid pattern '{pattern}': {e}"))
                })?);
            }
            _ => {}
        }

        if arity == 2 {
            // Both parameters were checked as numbers above.
            let (min, max) = (params[0].as_f64(), params[1].as_f64());
            if min > max {
                return Err(CoreError::InvalidArgument(format!(
                    "Rule '{kind}' requires min <= max, got {}..{}",
                    params[0], params[1]
                )));
            }
        }

        Ok(Self {
            kind,
            params,
            message: None,
            pattern: compiled,
        })
    }

    /// Value must equal `expected` exactly.
    pub fn equal(expected: impl Into<Value>) -> Self {
        Self {
            params: vec![expected.into()],
            ..Self::bare(RuleKind::Equal)
        }
    }

    /// Marks the field as skippable when its value is absent or empty.
    pub fn optional() -> Self {
        Self::bare(RuleKind::Optional)
    }

    pub fn min_length(min: u64) -> Self {
        Self {
            params: vec![min.into()],
            ..Self::bare(RuleKind::MinLength)
        }
    }

    pub fn max_length(max: u64) -> Self {
        Self {
            params: vec![max.into()],
            ..Self::bare(RuleKind::MaxLength)
        }
    }

    pub fn length(min: u64, max: u64) -> Result<Self, CoreError> {
        Self::from_parts(RuleKind::Length, vec![min.into(), max.into()])
    }

    pub fn email() -> Self {
        Self::bare(RuleKind::Email)
    }

    pub fn url() -> Self {
        Self::bare(RuleKind::Url)
    }

    /// Value must match `pattern`, compiled once here; invalid expressions
    /// are rejected at configuration time.
    pub fn regexp(pattern: &str) -> Result<Self, CoreError> {
        Self::from_parts(RuleKind::Regexp, vec![pattern.into()])
    }

    pub fn integer() -> Self {
        Self::bare(RuleKind::Integer)
    }

    pub fn numeric() -> Self {
        Self::bare(RuleKind::Numeric)
    }

    pub fn float() -> Self {
        Self::bare(RuleKind::Float)
    }

    pub fn range(min: impl Into<f64>, max: impl Into<f64>) -> Result<Self, CoreError> {
        let (min, max) = (min.into(), max.into());
        let to_value = |bound: f64| {
            serde_json::Number::from_f64(bound)
                .map(Value::Number)
                .ok_or_else(|| CoreError::InvalidArgument("Rule 'range' bounds must be finite".into()))
        };
        Self::from_parts(RuleKind::Range, vec![to_value(min)?, to_value(max)?])
    }

    pub fn uuid() -> Self {
        Self::bare(RuleKind::Uuid)
    }

    /// Replace the default failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The compiled pattern of a `regexp` rule.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Numeric parameter at `index`, if present.
    pub fn bound(&self, index: usize) -> Option<f64> {
        self.params.get(index).and_then(Value::as_f64)
    }
}

/// A single failed rule for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub rule: RuleKind,
    pub message: String,
}

impl ValidationError {
    /// Error not yet attributed to a field; [`super::Field`] fills the name in.
    pub fn new(rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            field: String::new(),
            rule,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}
