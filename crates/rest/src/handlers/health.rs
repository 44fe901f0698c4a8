//! Health check handler.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use bioref_store::ReferenceStore;

use crate::error::RestResult;
use crate::state::AppState;

/// GET /health
///
/// Verifies the reference database is reachable.
pub async fn health_check<S: ReferenceStore>(
    State(state): State<AppState<S>>,
) -> RestResult<Json<Value>> {
    state.store().health_check().await?;
    Ok(Json(json!({
        "status": "ok",
        "backend": state.store().backend_name(),
    })))
}
