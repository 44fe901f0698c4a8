//! Route table for the bioref API.

use axum::Router;
use axum::routing::{get, post};

use bioref_store::ReferenceStore;

use crate::handlers::{details, export, health, search, suggestions};
use crate::state::AppState;

/// Builds the API router.
///
/// `/search/main` is registered before the `/search/{table}` capture so the
/// composite search wins for the `main` table; every other table name falls
/// through to the single-table handler.
pub fn api_routes<S: ReferenceStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health::health_check::<S>))
        .route("/suggestions", get(suggestions::suggestions::<S>))
        .route("/search/main", post(search::search_main::<S>))
        .route("/search/{table}", post(search::search_table::<S>))
        .route("/details", get(details::details::<S>))
        .route("/export", post(export::export_records))
        .route("/export/main", get(export::export_main::<S>))
}
