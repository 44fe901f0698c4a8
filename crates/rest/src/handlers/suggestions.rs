//! Typeahead suggestion handler.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::debug;

use bioref_store::ReferenceStore;

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// Query parameters for the suggestion endpoint.
#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    /// The `main` column to complete against.
    pub field: Option<String>,
    /// The typed prefix.
    #[serde(default)]
    pub query: String,
}

/// GET /suggestions?field=...&query=...
///
/// Ranked value completions for one `main` column: distinct non-blank
/// values with a case-insensitive prefix match, shortest first, capped at
/// 50. An empty prefix answers `[]` without touching the store.
pub async fn suggestions<S: ReferenceStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<SuggestionParams>,
) -> RestResult<Json<Vec<String>>> {
    let field = params
        .field
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| RestError::bad_request("No field provided for suggestions"))?;

    if params.query.is_empty() {
        return Ok(Json(Vec::new()));
    }

    debug!(field, prefix = %params.query, "suggestion lookup");
    let values = state.store().suggest(field, &params.query).await?;
    Ok(Json(values))
}
