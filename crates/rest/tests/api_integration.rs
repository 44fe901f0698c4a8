//! Integration tests for the bioref HTTP API.
//!
//! Runs the full router against a seeded in-memory SQLite store, covering:
//! - Composite search (five buckets, name-join asymmetry, zero matches)
//! - Single-table search with left-to-right combinator chaining
//! - Typeahead suggestions (ranking, validation)
//! - Record details (per-identifier keys, missing rows)
//! - Downloads (CSV, JSON, XLSX, whole-table)

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use bioref_rest::{AppState, ServerConfig};
use bioref_store::{Row, SqliteStore, Table};
use serde_json::{Value, json};

/// Creates a test server over a seeded in-memory store.
async fn create_test_server() -> (TestServer, Arc<SqliteStore>) {
    let store = SqliteStore::in_memory().expect("Failed to create SQLite store");
    store.init_schema().expect("Failed to init schema");
    let store = Arc::new(store);

    seed_reference_data(&store);

    let state = AppState::new(Arc::clone(&store), ServerConfig::for_testing());
    let app = bioref_rest::routing::api_routes().with_state(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, store)
}

fn row(pairs: &[(&str, &str)]) -> Row {
    let mut map = Row::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), json!(v));
    }
    map
}

fn seed_reference_data(store: &SqliteStore) {
    store
        .load_rows(
            Table::Main,
            &[
                row(&[
                    ("productid", "P1"),
                    ("productndc", "0001-0001"),
                    ("ndcpackagecode", "0001-0001-01"),
                    ("proprietaryname", "Humira"),
                    ("nonproprietaryname", "adalimumab"),
                    ("unii", "FYS6T7F842"),
                    ("labelername", "AbbVie"),
                ]),
                row(&[
                    ("productid", "P2"),
                    ("productndc", "0002-0001"),
                    ("ndcpackagecode", "0002-0001-01"),
                    ("proprietaryname", "Enbrel"),
                    ("nonproprietaryname", "etanercept"),
                    ("unii", "OP401G7OJC"),
                    ("labelername", "Amgen"),
                ]),
                row(&[
                    ("productid", "P3"),
                    ("productndc", "0003-0001"),
                    ("ndcpackagecode", "0003-0001-01"),
                    ("proprietaryname", "Humulin"),
                    ("nonproprietaryname", "insulin human"),
                    ("labelername", "Lilly"),
                ]),
            ],
        )
        .expect("Failed to seed main");

    store
        .load_rows(
            Table::Product,
            &[
                row(&[
                    ("productid", "P1"),
                    ("proprietaryname", "Humira"),
                    ("dosageformname", "INJECTION"),
                ]),
                row(&[("productid", "P2"), ("proprietaryname", "Enbrel")]),
            ],
        )
        .expect("Failed to seed product");

    store
        .load_rows(
            Table::Package,
            &[
                row(&[
                    ("ndcpackagecode", "0001-0001-01"),
                    ("productid", "P1"),
                    ("packagedescription", "1 CARTON"),
                ]),
                row(&[("ndcpackagecode", "0002-0001-01"), ("productid", "P2")]),
            ],
        )
        .expect("Failed to seed package");

    store
        .load_rows(
            Table::Therapeutic,
            &[
                // Matches "humira" only by exact normalized equality.
                row(&[
                    ("t_id", "T1"),
                    ("proprietaryname", "HUMIRA "),
                    ("productid", "P1"),
                    ("audit_status", "reviewed"),
                ]),
                row(&[("t_id", "T2"), ("proprietaryname", "humira pen kit")]),
            ],
        )
        .expect("Failed to seed therapeutic");

    store
        .load_rows(
            Table::Trial,
            &[
                // Matches "humira" by substring; the therapeutic join would
                // not accept this name.
                row(&[
                    ("trial_idc_identifier", "TR1"),
                    ("proprietaryname", "Humira Pen Kit"),
                    ("immunogenicity_testing", "yes"),
                ]),
                row(&[
                    ("trial_idc_identifier", "TR2"),
                    ("proprietaryname", "Enbrel"),
                ]),
                row(&[
                    ("trial_idc_identifier", "TR3"),
                    ("proprietaryname", "Humira"),
                ]),
            ],
        )
        .expect("Failed to seed trial");
}

// ============================================================
// Health
// ============================================================

#[tokio::test]
async fn test_health_check() {
    let (server, _store) = create_test_server().await;

    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "sqlite");
}

// ============================================================
// Composite search
// ============================================================

#[tokio::test]
async fn test_composite_search_populates_all_buckets() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/main")
        .json(&json!({
            "filters": { "proprietaryname": { "value": "Humira", "operator": "AND" } }
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["main"].as_array().unwrap().len(), 1);
    assert_eq!(body["main"][0]["productid"], "P1");
    assert_eq!(body["product"].as_array().unwrap().len(), 1);
    assert_eq!(body["package"].as_array().unwrap().len(), 1);

    // Therapeutic joins by exact normalized name: only T1.
    let therapeutic = body["therapeutic"].as_array().unwrap();
    assert_eq!(therapeutic.len(), 1);
    assert_eq!(therapeutic[0]["t_id"], "T1");

    // Trials join by normalized substring: both the exact name and the
    // qualified "Humira Pen Kit" match.
    let trials = body["immunogenicity"].as_array().unwrap();
    assert_eq!(trials.len(), 2);
    let ids: Vec<&str> = trials
        .iter()
        .map(|t| t["trial_idc_identifier"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"TR1"));
    assert!(ids.contains(&"TR3"));
}

#[tokio::test]
async fn test_composite_search_zero_matches_returns_empty_buckets() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/main")
        .json(&json!({
            "filters": { "proprietaryname": { "value": "no-such-drug" } }
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    for bucket in ["main", "product", "package", "therapeutic", "immunogenicity"] {
        assert_eq!(body[bucket], json!([]), "bucket {bucket}");
    }
}

#[tokio::test]
async fn test_composite_search_unknown_field_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/main")
        .json(&json!({
            "filters": { "evil'); --": { "value": "x" } }
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("evil"));
}

#[tokio::test]
async fn test_composite_search_bad_combinator_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/main")
        .json(&json!({
            "filters": { "productid": { "value": "P1", "operator": "NAND" } }
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================
// Single-table search
// ============================================================

#[tokio::test]
async fn test_table_search_contains_match() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/product")
        .json(&json!({
            "filters": { "proprietaryname": { "value": "humi" } }
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["productid"], "P1");
}

#[tokio::test]
async fn test_table_search_left_to_right_chaining() {
    let (server, _store) = create_test_server().await;

    // (labelername ~ AbbVie AND proprietaryname ~ Enbrel) OR unii ~ OP4:
    // the AND pair matches nothing, the OR term rescues Enbrel.
    let response = server
        .post("/search/main")
        .json(&json!({
            "filters": {
                "labelername": { "value": "AbbVie", "operator": "AND" },
                "proprietaryname": { "value": "Enbrel", "operator": "AND" },
                "unii": { "value": "OP4", "operator": "OR" }
            },
            "fieldsOrder": ["labelername", "proprietaryname", "unii"]
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    let main = body["main"].as_array().unwrap();
    assert_eq!(main.len(), 1);
    assert_eq!(main[0]["productid"], "P2");
}

#[tokio::test]
async fn test_table_search_empty_filter_returns_whole_table() {
    let (server, _store) = create_test_server().await;

    let response = server.post("/search/package").json(&json!({})).await;
    response.assert_status(StatusCode::OK);

    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_table_search_immunogenicity_alias() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/immunogenicity")
        .json(&json!({
            "filters": { "proprietaryname": { "value": "Enbrel" } }
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let rows: Vec<Value> = response.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["trial_idc_identifier"], "TR2");
}

#[tokio::test]
async fn test_table_search_unknown_table_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/users")
        .json(&json!({ "filters": {} }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_table_search_sql_injection_in_value_matches_nothing() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/search/main")
        .json(&json!({
            "filters": { "proprietaryname": { "value": "'; DROP TABLE main; --" } }
        }))
        .await;
    response.assert_status(StatusCode::OK);

    // The value is bound, not interpolated: no matches, and the table
    // still answers afterwards.
    let followup = server.post("/search/product").json(&json!({})).await;
    followup.assert_status(StatusCode::OK);
}

// ============================================================
// Suggestions
// ============================================================

#[tokio::test]
async fn test_suggestions_ranked_shortest_first() {
    let (server, store) = create_test_server().await;

    store
        .load_rows(
            Table::Main,
            &[
                row(&[("productid", "S1"), ("proprietaryname", "Humalog Mix")]),
                row(&[("productid", "S2"), ("proprietaryname", "Humalog")]),
            ],
        )
        .expect("Failed to seed suggestions");

    let response = server
        .get("/suggestions")
        .add_query_param("field", "proprietaryname")
        .add_query_param("query", "hum")
        .await;
    response.assert_status(StatusCode::OK);

    let values: Vec<String> = response.json();
    assert_eq!(values, vec!["Humira", "Humalog", "Humulin", "Humalog Mix"]);
}

#[tokio::test]
async fn test_suggestions_empty_query_is_empty_list() {
    let (server, _store) = create_test_server().await;

    let response = server
        .get("/suggestions")
        .add_query_param("field", "proprietaryname")
        .add_query_param("query", "")
        .await;
    response.assert_status(StatusCode::OK);

    let values: Vec<String> = response.json();
    assert!(values.is_empty());
}

#[tokio::test]
async fn test_suggestions_missing_field_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .get("/suggestions")
        .add_query_param("query", "hum")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "No field provided for suggestions");
}

#[tokio::test]
async fn test_suggestions_unknown_field_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .get("/suggestions")
        .add_query_param("field", "password")
        .add_query_param("query", "x")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================
// Details
// ============================================================

#[tokio::test]
async fn test_details_with_both_identifiers() {
    let (server, _store) = create_test_server().await;

    let response = server
        .get("/details")
        .add_query_param("productid", "P1")
        .add_query_param("ndcpackagecode", "0001-0001-01")
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["product"]["productid"], "P1");
    assert_eq!(body["therapeutic"]["t_id"], "T1");
    // The details trial join is exact on proprietaryname, so the
    // qualified "Humira Pen Kit" trial is skipped.
    assert_eq!(body["immunogenicity"]["trial_idc_identifier"], "TR3");
    assert_eq!(body["package"]["ndcpackagecode"], "0001-0001-01");
}

#[tokio::test]
async fn test_details_productid_only_has_no_package_key() {
    let (server, _store) = create_test_server().await;

    let response = server
        .get("/details")
        .add_query_param("productid", "P2")
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert!(body.get("product").is_some());
    assert!(body.get("package").is_none());
}

#[tokio::test]
async fn test_details_missing_rows_are_empty_objects() {
    let (server, _store) = create_test_server().await;

    let response = server
        .get("/details")
        .add_query_param("productid", "no-such-product")
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["product"], json!({}));
    assert_eq!(body["therapeutic"], json!({}));
    assert_eq!(body["immunogenicity"], json!({}));
}

#[tokio::test]
async fn test_details_without_identifiers_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server.get("/details").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "Missing productid or ndcpackagecode");
}

// ============================================================
// Downloads
// ============================================================

#[tokio::test]
async fn test_export_csv() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/export")
        .json(&json!({
            "records": [
                { "productid": "P1", "proprietaryname": "Humira" },
                { "productid": "P2", "proprietaryname": "Enbrel" }
            ],
            "format": "csv"
        }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"data.csv\""
    );

    let text = response.text();
    assert!(text.starts_with("productid,proprietaryname"));
    assert!(text.contains("P1,Humira"));
}

#[tokio::test]
async fn test_export_xlsx_is_zip() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/export")
        .json(&json!({
            "records": [{ "productid": "P1" }],
            "format": "spreadsheet"
        }))
        .await;
    response.assert_status(StatusCode::OK);

    let bytes = response.as_bytes();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn test_export_unknown_format_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/export")
        .json(&json!({ "records": [], "format": "pdf" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid format for download");
}

#[tokio::test]
async fn test_export_non_array_records_is_bad_request() {
    let (server, _store) = create_test_server().await;

    let response = server
        .post("/export")
        .json(&json!({ "records": "not-an-array", "format": "csv" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid data for download");
}

#[tokio::test]
async fn test_export_main_whole_table() {
    let (server, _store) = create_test_server().await;

    let response = server.get("/export/main").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"main.xlsx\""
    );

    let bytes = response.as_bytes();
    assert_eq!(&bytes[..2], b"PK");
}
