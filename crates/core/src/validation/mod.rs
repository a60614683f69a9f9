//! Data validation engine.
//!
//! Provides rule descriptors, a pure-logic evaluator, and the field / scope
//! containers that turn a raw input map into an ordered error list. The
//! engine never fails on bad input; it only reports.

pub mod field;
pub mod input;
pub mod rules;
pub mod scope;
pub mod validator;

pub use field::Field;
pub use input::Input;
pub use rules::{Rule, RuleKind, ValidationError};
pub use scope::ValidationScope;
pub use validator::{RuleValidator, Validator};
