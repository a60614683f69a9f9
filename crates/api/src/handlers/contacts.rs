//! Demonstration contact resource.
//!
//! Backed by a fixed in-memory directory; exercises query validation,
//! body validation, empty results (204) and entity tags.

use axum::extract::State;
use axum::response::Response;
use restful_core::resource::Resource;
use restful_core::validation::{Input, Rule};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extract::RestRequest;
use crate::pipeline::ResourceHandler;
use crate::state::AppState;

const DIRECTORY: [(&str, &str); 3] = [
    ("Ada Lovelace", "ada@example.com"),
    ("Grace Hopper", "grace@example.com"),
    ("Alan Turing", "alan@example.com"),
];

/// GET /api/v1/contacts?name=&limit=
///
/// Contacts whose name contains `name` (case-insensitive). An empty result
/// leaves the resource empty, which is answered with 204.
pub struct ListContacts;

impl ResourceHandler for ListContacts {
    fn validate(&self, input: &mut Input) {
        input
            .field("name")
            .add_rule(Rule::optional())
            .add_rule(Rule::max_length(64));
        input
            .field("limit")
            .add_rule(Rule::optional())
            .add_rule(Rule::integer())
            .add_rule(Rule::range(1, 100).expect("ordered bounds"));
    }

    fn build(&self, input: &Input, resource: &mut Resource) -> AppResult<()> {
        let needle = input
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        let limit = input
            .get("limit")
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or(v.as_u64()))
            .unwrap_or(100) as usize;

        let contacts: Vec<Value> = DIRECTORY
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .take(limit)
            .map(|(name, email)| json!({"name": name, "email": email}))
            .collect();

        if !contacts.is_empty() {
            resource.set("contacts", contacts);
        }
        Ok(())
    }
}

/// POST /api/v1/contacts
///
/// Validates the submitted contact and echoes it back with 201.
pub struct CreateContact;

impl ResourceHandler for CreateContact {
    fn validate(&self, input: &mut Input) {
        input
            .field("name")
            .add_rule(Rule::length(2, 64).expect("ordered bounds"));
        input.field("email").add_rule(Rule::email());
        input
            .field("age")
            .add_rule(Rule::optional())
            .add_rule(Rule::integer())
            .add_rule(Rule::range(0, 150).expect("ordered bounds"));
        input
            .field("website")
            .add_rule(Rule::optional())
            .add_rule(Rule::url());
    }

    fn status(&self) -> Option<u16> {
        Some(201)
    }

    fn build(&self, input: &Input, resource: &mut Resource) -> AppResult<()> {
        let mut contact = serde_json::Map::new();
        for key in ["name", "email", "age", "website"] {
            if let Some(value) = input.get(key) {
                contact.insert(key.to_string(), value.clone());
            }
        }
        tracing::info!(name = ?input.get("name"), "Contact accepted");
        resource.set("contact", Value::Object(contact));
        Ok(())
    }
}

pub async fn list_contacts(State(state): State<AppState>, request: RestRequest) -> Response {
    state.pipeline.handle(&ListContacts, request).await
}

pub async fn create_contact(State(state): State<AppState>, request: RestRequest) -> Response {
    state.pipeline.handle(&CreateContact, request).await
}
