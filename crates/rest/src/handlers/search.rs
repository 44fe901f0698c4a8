//! Search handlers: per-table filter search and the composite
//! cross-reference search.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use bioref_store::{
    Combinator, CompositeResult, FilterSpec, FilterTerm, ReferenceStore, Row, Table,
    search_composite,
};

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// One field of the search form: the typed value plus the AND/OR joiner
/// selected next to it.
#[derive(Debug, Deserialize)]
pub struct FilterEntry {
    /// Search text; blank means the field is not constrained.
    #[serde(default)]
    pub value: String,
    /// Joiner against the fields before this one. Defaults to AND.
    #[serde(default)]
    pub operator: Option<String>,
}

/// Body of the search endpoints.
///
/// `filters` maps column names to entries; `fieldsOrder` optionally fixes
/// the order the terms chain in. Without it the mapping's own key order is
/// used.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Column name to filter entry.
    #[serde(default)]
    pub filters: serde_json::Map<String, Value>,
    /// Explicit chaining order for the filter fields.
    #[serde(rename = "fieldsOrder", default)]
    pub fields_order: Option<Vec<String>>,
}

impl SearchRequest {
    /// Converts the request body into an ordered filter.
    ///
    /// Order is the client's `fieldsOrder` when present (names absent from
    /// `filters` are skipped), otherwise the natural key order of the
    /// `filters` mapping. Field names are validated later, against the
    /// target table's allow-list; combinators are validated here.
    pub fn to_filter(&self) -> RestResult<FilterSpec> {
        let ordered: Vec<&String> = match &self.fields_order {
            Some(order) => order.iter().filter(|f| self.filters.contains_key(*f)).collect(),
            None => self.filters.keys().collect(),
        };

        let mut spec = FilterSpec::new();
        for field in ordered {
            let entry: FilterEntry = serde_json::from_value(self.filters[field.as_str()].clone())
                .map_err(|_| {
                    RestError::bad_request(format!("Invalid filter entry for field '{}'", field))
                })?;
            let combinator = match entry.operator.as_deref() {
                None => Combinator::default(),
                Some(op) => op
                    .parse::<Combinator>()
                    .map_err(|e| RestError::bad_request(e.to_string()))?,
            };
            spec.push(FilterTerm::new(field.clone(), entry.value, combinator));
        }
        Ok(spec)
    }
}

/// POST /search/main
///
/// Runs the filter against the `main` table and correlates the matches
/// across the other four tables into the five-bucket composite response.
pub async fn search_main<S: ReferenceStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<SearchRequest>,
) -> RestResult<Json<CompositeResult>> {
    let filter = request.to_filter()?;
    debug!(terms = filter.terms().len(), "composite search");
    let result = search_composite(state.store(), &filter, state.lookup_timeout()).await?;
    Ok(Json(result))
}

/// POST /search/{table}
///
/// Runs the filter against one table and returns the matching rows.
pub async fn search_table<S: ReferenceStore>(
    State(state): State<AppState<S>>,
    Path(table): Path<String>,
    Json(request): Json<SearchRequest>,
) -> RestResult<Json<Vec<Row>>> {
    let table: Table = table
        .parse()
        .map_err(|e: bioref_store::FilterError| RestError::bad_request(e.to_string()))?;
    let filter = request.to_filter()?;
    debug!(%table, terms = filter.terms().len(), "table search");
    let rows = state.store().search(table, &filter).await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> SearchRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_fields_order_drives_term_order() {
        let req = request(json!({
            "filters": {
                "proprietaryname": { "value": "humira", "operator": "OR" },
                "productid": { "value": "P1", "operator": "AND" }
            },
            "fieldsOrder": ["productid", "proprietaryname"]
        }));
        let spec = req.to_filter().unwrap();
        assert_eq!(spec.terms()[0].field, "productid");
        assert_eq!(spec.terms()[1].field, "proprietaryname");
        assert_eq!(spec.terms()[1].combinator, Combinator::Or);
    }

    #[test]
    fn test_fields_order_skips_missing_fields() {
        let req = request(json!({
            "filters": { "productid": { "value": "P1" } },
            "fieldsOrder": ["unii", "productid"]
        }));
        let spec = req.to_filter().unwrap();
        assert_eq!(spec.terms().len(), 1);
        assert_eq!(spec.terms()[0].field, "productid");
    }

    #[test]
    fn test_missing_order_uses_mapping_key_order() {
        let req = request(json!({
            "filters": {
                "unii": { "value": "U1" },
                "productid": { "value": "P1" }
            }
        }));
        let spec = req.to_filter().unwrap();
        // preserve_order keeps the JSON body's key order
        assert_eq!(spec.terms()[0].field, "unii");
        assert_eq!(spec.terms()[1].field, "productid");
    }

    #[test]
    fn test_missing_operator_defaults_to_and() {
        let req = request(json!({
            "filters": { "productid": { "value": "P1" } }
        }));
        let spec = req.to_filter().unwrap();
        assert_eq!(spec.terms()[0].combinator, Combinator::And);
    }

    #[test]
    fn test_bad_operator_rejected() {
        let req = request(json!({
            "filters": { "productid": { "value": "P1", "operator": "XOR" } }
        }));
        let err = req.to_filter().unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
    }

    #[test]
    fn test_empty_body_is_empty_filter() {
        let req = request(json!({}));
        let spec = req.to_filter().unwrap();
        assert!(spec.terms().is_empty());
    }
}
