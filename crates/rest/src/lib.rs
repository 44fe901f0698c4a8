//! # bioref-rest — HTTP API for the bioref search service
//!
//! Exposes the pharmaceutical reference search, suggestion, detail, and
//! download operations over HTTP. Handlers are generic over the
//! [`ReferenceStore`](bioref_store::ReferenceStore) implementation.
//!
//! ## Endpoints
//!
//! | Operation | HTTP Method | URL |
//! |-----------|-------------|-----|
//! | health check | GET | `/health` |
//! | typeahead suggestions | GET | `/suggestions?field=&query=` |
//! | composite search | POST | `/search/main` |
//! | single-table search | POST | `/search/{table}` |
//! | record details | GET | `/details?productid=&ndcpackagecode=` |
//! | download records | POST | `/export` |
//! | download whole main table | GET | `/export/main` |
//!
//! ## Error Handling
//!
//! Errors are returned as `{"error": "..."}` JSON bodies. Malformed input
//! (unknown tables, fields, combinators, or formats) is 400 with a
//! descriptive message; reference database failures are 500 with a generic
//! message and a server-side log line.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bioref_rest::{ServerConfig, create_app};
//! use bioref_store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteStore::open("bioref.db")?;
//!     let app = create_app(store);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routing;
pub mod state;

pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use bioref_store::ReferenceStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<S>(store: S) -> Router
where
    S: ReferenceStore + 'static,
{
    create_app_with_config(store, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
pub fn create_app_with_config<S>(store: S, config: ServerConfig) -> Router
where
    S: ReferenceStore + 'static,
{
    info!(backend = store.backend_name(), "creating API server");

    let state = AppState::new(Arc::new(store), config.clone());
    let router = routing::api_routes().with_state(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// Call once at application startup.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "bioref_rest={level},bioref_store={level},tower_http=debug"
            ))
        });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
