//! Validation rule engine and response negotiation for REST resources.
//!
//! - [`validation`] -- rule descriptors, fields and scopes producing
//!   structured error sets from raw input maps.
//! - [`resource`] -- the outbound resource model and the error envelope.
//! - [`negotiation`] -- content-type resolution, cache validators, mappers
//!   and response builders.
//!
//! Everything here is synchronous and free of any HTTP framework; the
//! `restful-api` crate wires it into axum.

pub mod error;
pub mod hashing;
pub mod negotiation;
pub mod resource;
pub mod validation;
