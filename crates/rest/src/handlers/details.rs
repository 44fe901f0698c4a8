//! Record detail handler.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use bioref_store::ReferenceStore;

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// Query parameters for the details endpoint.
#[derive(Debug, Deserialize)]
pub struct DetailsParams {
    /// Product identifier to expand.
    pub productid: Option<String>,
    /// Package code to expand.
    pub ndcpackagecode: Option<String>,
}

/// GET /details?productid=...&ndcpackagecode=...
///
/// Expands one search result row. The response carries a key per supplied
/// identifier only: `product`, `therapeutic`, and `immunogenicity` when
/// `productid` is present, `package` when `ndcpackagecode` is. A missing
/// row is an empty object, never an error.
pub async fn details<S: ReferenceStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<DetailsParams>,
) -> RestResult<Json<Map<String, Value>>> {
    let productid = params.productid.as_deref().filter(|s| !s.is_empty());
    let ndcpackagecode = params.ndcpackagecode.as_deref().filter(|s| !s.is_empty());

    if productid.is_none() && ndcpackagecode.is_none() {
        return Err(RestError::bad_request("Missing productid or ndcpackagecode"));
    }

    let store = state.store();
    let mut body = Map::new();

    if let Some(id) = productid {
        let product = store.product_details(id).await?;
        let therapeutic = store.therapeutic_details(id).await?;
        let trial = store.trial_details_for_product(id).await?;
        body.insert("product".to_string(), row_or_empty(product));
        body.insert("therapeutic".to_string(), row_or_empty(therapeutic));
        body.insert("immunogenicity".to_string(), row_or_empty(trial));
    }

    if let Some(code) = ndcpackagecode {
        let package = store.package_details(code).await?;
        body.insert("package".to_string(), row_or_empty(package));
    }

    Ok(Json(body))
}

fn row_or_empty(row: Option<bioref_store::Row>) -> Value {
    match row {
        Some(row) => Value::Object(row),
        None => json!({}),
    }
}
