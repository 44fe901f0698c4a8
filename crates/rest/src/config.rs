//! Server configuration for the bioref HTTP API.
//!
//! Configuration comes from command line arguments, `BIOREF_*` environment
//! variables, or code, in that order of precedence.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BIOREF_SERVER_PORT` | 5000 | Server port |
//! | `BIOREF_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `BIOREF_LOG_LEVEL` | info | Log level |
//! | `BIOREF_DATABASE_URL` | bioref.db | SQLite database path (`:memory:` supported) |
//! | `BIOREF_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `BIOREF_LOOKUP_TIMEOUT` | 10 | Per-lookup timeout for the composite fan-out (seconds) |
//! | `BIOREF_ENABLE_CORS` | true | Enable CORS |
//! | `BIOREF_CORS_ORIGINS` | * | Allowed origins |
//! | `BIOREF_BASE_URL` | http://localhost:5000 | Server base URL |

use clap::Parser;

/// Server configuration for the bioref HTTP API.
///
/// Construct from command line arguments with [`ServerConfig::parse`], from
/// the environment with [`ServerConfig::from_env`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "bioref-server")]
#[command(about = "Pharmaceutical reference search API server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "BIOREF_SERVER_PORT", default_value = "5000")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "BIOREF_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "BIOREF_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Path to the SQLite reference database (`:memory:` for an empty
    /// in-memory database).
    #[arg(long, env = "BIOREF_DATABASE_URL", default_value = "bioref.db")]
    pub database_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "BIOREF_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Timeout in seconds for each downstream lookup in the composite
    /// search fan-out.
    #[arg(long, env = "BIOREF_LOOKUP_TIMEOUT", default_value = "10")]
    pub lookup_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "BIOREF_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "BIOREF_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "BIOREF_CORS_METHODS", default_value = "GET,POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(long, env = "BIOREF_CORS_HEADERS", default_value = "Content-Type,Accept")]
    pub cors_headers: String,

    /// Base URL for the server (used in log lines and generated links).
    #[arg(long, env = "BIOREF_BASE_URL", default_value = "http://localhost:5000")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            database_url: "bioref.db".to_string(),
            request_timeout: 30,
            lookup_timeout: 10,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,OPTIONS".to_string(),
            cors_headers: "Content-Type,Accept".to_string(),
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration and returns all problems found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }
        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }
        if self.lookup_timeout == 0 {
            errors.push("Lookup timeout cannot be 0".to_string());
        }
        if self.database_url.trim().is_empty() {
            errors.push("Database path cannot be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Creates a configuration suitable for tests: ephemeral port,
    /// in-memory database, short timeouts, no CORS.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            database_url: ":memory:".to_string(),
            request_timeout: 5,
            lookup_timeout: 2,
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            base_url: "http://localhost:0".to_string(),
        }
    }
}
