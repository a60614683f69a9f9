pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /contacts        list (GET), create (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route(
        "/contacts",
        get(handlers::contacts::list_contacts).post(handlers::contacts::create_contact),
    )
}
