//! Verifies the handler-level short-circuits: requests that can be
//! answered without data never reach the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use bioref_rest::{AppState, ServerConfig};
use bioref_store::{FilterSpec, ReferenceStore, Row, StoreResult, Table};

/// Mock store that counts every call it receives.
#[derive(Default)]
struct CountingStore {
    suggests: AtomicUsize,
    searches: AtomicUsize,
    downstream: AtomicUsize,
}

#[async_trait]
impl ReferenceStore for CountingStore {
    fn backend_name(&self) -> &'static str {
        "counting-mock"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn search(&self, _table: Table, _filter: &FilterSpec) -> StoreResult<Vec<Row>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn suggest(&self, _field: &str, _prefix: &str) -> StoreResult<Vec<String>> {
        self.suggests.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["value".to_string()])
    }

    async fn products_by_id(&self, _ids: &[String]) -> StoreResult<Vec<Row>> {
        self.downstream.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn packages_by_code(&self, _codes: &[String]) -> StoreResult<Vec<Row>> {
        self.downstream.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn therapeutics_by_name(&self, _names: &[String]) -> StoreResult<Vec<Row>> {
        self.downstream.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn trials_by_name(&self, _names: &[String]) -> StoreResult<Vec<Row>> {
        self.downstream.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn product_details(&self, _productid: &str) -> StoreResult<Option<Row>> {
        Ok(None)
    }

    async fn therapeutic_details(&self, _productid: &str) -> StoreResult<Option<Row>> {
        Ok(None)
    }

    async fn trial_details_for_product(&self, _productid: &str) -> StoreResult<Option<Row>> {
        Ok(None)
    }

    async fn package_details(&self, _ndcpackagecode: &str) -> StoreResult<Option<Row>> {
        Ok(None)
    }

    async fn all_main_rows(&self) -> StoreResult<Vec<Row>> {
        Ok(Vec::new())
    }
}

fn create_test_server() -> (TestServer, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let state = AppState::new(Arc::clone(&store), ServerConfig::for_testing());
    let app = bioref_rest::routing::api_routes().with_state(state);
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, store)
}

#[tokio::test]
async fn test_empty_suggestion_query_never_reaches_store() {
    let (server, store) = create_test_server();

    let response = server
        .get("/suggestions")
        .add_query_param("field", "proprietaryname")
        .add_query_param("query", "")
        .await;
    response.assert_status(StatusCode::OK);

    let values: Vec<String> = response.json();
    assert!(values.is_empty());
    assert_eq!(store.suggests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_suggestion_field_never_reaches_store() {
    let (server, store) = create_test_server();

    let response = server
        .get("/suggestions")
        .add_query_param("query", "hum")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(store.suggests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_nonempty_suggestion_query_reaches_store_once() {
    let (server, store) = create_test_server();

    let response = server
        .get("/suggestions")
        .add_query_param("field", "proprietaryname")
        .add_query_param("query", "hum")
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(store.suggests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_match_composite_issues_no_downstream_lookups() {
    let (server, store) = create_test_server();

    let response = server
        .post("/search/main")
        .json(&serde_json::json!({
            "filters": { "proprietaryname": { "value": "anything" } }
        }))
        .await;
    response.assert_status(StatusCode::OK);

    assert_eq!(store.searches.load(Ordering::SeqCst), 1);
    assert_eq!(store.downstream.load(Ordering::SeqCst), 0);
}
