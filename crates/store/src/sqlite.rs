//! SQLite implementation of [`ReferenceStore`].
//!
//! Connections come from an r2d2 pool; because rusqlite is synchronous and
//! the public trait is async, every query runs on the tokio blocking pool
//! with its own pooled connection. That is what lets the cross-reference
//! fan-out issue its four lookups concurrently.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StoreError, StoreResult};
use crate::filter::{FilterSpec, escape_like};
use crate::schema;
use crate::store::ReferenceStore;
use crate::tables::{Row, Table};

/// Maximum number of suggestion completions returned per request.
pub const SUGGESTION_LIMIT: usize = 50;

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquisition timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// SQLite-backed reference store.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteStoreConfig,
    is_memory: bool,
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Creates a new in-memory store.
    ///
    /// Note that `:memory:` databases are per-connection; in-memory stores
    /// therefore pool a single shared connection.
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_config(":memory:", SqliteStoreConfig::default())
    }

    /// Opens or creates a file-based database.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::with_config(path, SqliteStoreConfig::default())
    }

    /// Creates a store with custom pool configuration.
    pub fn with_config<P: AsRef<Path>>(path: P, config: SqliteStoreConfig) -> StoreResult<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let is_memory = path_str == ":memory:";

        let manager = SqliteConnectionManager::file(path.as_ref());

        // Each connection to ":memory:" would otherwise see its own empty
        // database.
        let max_size = if is_memory { 1 } else { config.max_connections };

        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(config.min_connections.min(max_size)))
            .connection_timeout(std::time::Duration::from_millis(
                config.connection_timeout_ms,
            ))
            .build(manager)
            .map_err(|e| BackendError::ConnectionFailed {
                message: e.to_string(),
            })?;

        let store = Self {
            pool,
            config,
            is_memory,
        };
        store.configure_connection()?;

        Ok(store)
    }

    /// Creates the reference tables if they do not exist.
    pub fn init_schema(&self) -> StoreResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn).map_err(|e| {
            StoreError::Backend(BackendError::QueryFailed {
                message: format!("failed to initialize schema: {e}"),
            })
        })
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Bulk-loads rows into a reference table.
    ///
    /// This is a loading aid for tests and dataset import scripts, not part
    /// of the serving surface — the service itself never writes. Row keys
    /// outside the table's column allow-list are rejected.
    pub fn load_rows(&self, table: Table, rows: &[Row]) -> StoreResult<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction().map_err(query_failed)?;

        let mut inserted = 0;
        for row in rows {
            let mut columns: Vec<&'static str> = Vec::with_capacity(row.len());
            for key in row.keys() {
                columns.push(table.resolve_column(key)?);
            }
            if columns.is_empty() {
                continue;
            }
            let placeholders = vec!["?"; columns.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table.name(),
                columns.join(", "),
                placeholders
            );
            let values: Vec<rusqlite::types::Value> = row
                .values()
                .map(|v| match v {
                    serde_json::Value::Null => rusqlite::types::Value::Null,
                    serde_json::Value::String(s) => rusqlite::types::Value::Text(s.clone()),
                    other => rusqlite::types::Value::Text(other.to_string()),
                })
                .collect();
            tx.execute(&sql, rusqlite::params_from_iter(values))
                .map_err(query_failed)?;
            inserted += 1;
        }

        tx.commit().map_err(query_failed)?;
        Ok(inserted)
    }

    fn get_connection(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            StoreError::Backend(BackendError::ConnectionFailed {
                message: e.to_string(),
            })
        })
    }

    fn configure_connection(&self) -> StoreResult<()> {
        let conn = self.get_connection()?;
        conn.busy_timeout(std::time::Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(query_failed_store)?;
        Ok(())
    }

    /// Runs a closure with a pooled connection on the blocking pool.
    async fn run_blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(PooledConnection<SqliteConnectionManager>) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                StoreError::Backend(BackendError::ConnectionFailed {
                    message: e.to_string(),
                })
            })?;
            f(conn)
        })
        .await
        .map_err(|e| {
            StoreError::Backend(BackendError::QueryFailed {
                message: format!("blocking task failed: {e}"),
            })
        })?
    }
}

fn query_failed(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(BackendError::QueryFailed {
        message: e.to_string(),
    })
}

fn query_failed_store(e: rusqlite::Error) -> StoreError {
    query_failed(e)
}

/// Converts one SQLite column value to JSON.
fn column_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        // The reference schema has no blob columns.
        ValueRef::Blob(_) => serde_json::Value::Null,
    }
}

/// Executes a query and materializes every row as a column-name map.
fn fetch_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql).map_err(query_failed)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows = stmt.query(params).map_err(query_failed)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(query_failed)? {
        let mut map = Row::new();
        for (i, column) in columns.iter().enumerate() {
            let value = row.get_ref(i).map_err(query_failed)?;
            map.insert(column.clone(), column_value(value));
        }
        out.push(map);
    }
    Ok(out)
}

/// `?, ?, ...` — one placeholder per IN-list member.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[async_trait]
impl ReferenceStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.run_blocking(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(query_failed)
        })
        .await
    }

    async fn search(&self, table: Table, filter: &FilterSpec) -> StoreResult<Vec<Row>> {
        // Validate and build before touching the pool so client errors
        // never cost a connection.
        let built = filter.build(table)?;
        let sql = match &built {
            Some(f) => format!("SELECT * FROM {} WHERE {}", table.name(), f.clause),
            None => format!("SELECT * FROM {}", table.name()),
        };
        let params = built.map(|f| f.params).unwrap_or_default();

        tracing::debug!(table = %table, params = params.len(), "searching reference table");
        self.run_blocking(move |conn| {
            fetch_rows(&conn, &sql, rusqlite::params_from_iter(params))
        })
        .await
    }

    async fn suggest(&self, field: &str, prefix: &str) -> StoreResult<Vec<String>> {
        let column = Table::Main.resolve_column(field)?;
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        // Subquery so the ORDER BY can use LENGTH(), which is not in the
        // DISTINCT select list. Shorter values rank first so the closest
        // completions surface at the top.
        let sql = format!(
            "SELECT suggestion FROM ( \
                 SELECT DISTINCT {column} AS suggestion FROM main \
                 WHERE {column} IS NOT NULL AND {column} <> '' \
                 AND {column} LIKE ?1 ESCAPE '\\' \
             ) ORDER BY LENGTH(suggestion), suggestion ASC LIMIT {SUGGESTION_LIMIT}"
        );
        let pattern = format!("{}%", escape_like(prefix));

        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(query_failed)?;
            let values = stmt
                .query_map([pattern], |row| row.get::<_, String>(0))
                .map_err(query_failed)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(query_failed)?;
            Ok(values)
        })
        .await
    }

    async fn products_by_id(&self, ids: &[String]) -> StoreResult<Vec<Row>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT productid, productndc, producttypename, proprietaryname, nonproprietaryname \
             FROM product WHERE productid IN ({})",
            placeholders(ids.len())
        );
        let ids = ids.to_vec();
        self.run_blocking(move |conn| fetch_rows(&conn, &sql, rusqlite::params_from_iter(ids)))
            .await
    }

    async fn packages_by_code(&self, codes: &[String]) -> StoreResult<Vec<Row>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM package WHERE ndcpackagecode IN ({})",
            placeholders(codes.len())
        );
        let codes = codes.to_vec();
        self.run_blocking(move |conn| fetch_rows(&conn, &sql, rusqlite::params_from_iter(codes)))
            .await
    }

    async fn therapeutics_by_name(&self, names: &[String]) -> StoreResult<Vec<Row>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        // Exact match on the normalized name: the therapeutic table carries
        // the same proprietary names as main, modulo case and whitespace.
        let sql = format!(
            "SELECT t_id, audit_status, proprietaryname, nonproprietaryname, unii, \
                    productid, ndcpackagecode \
             FROM therapeutic WHERE TRIM(LOWER(proprietaryname)) IN ({})",
            placeholders(names.len())
        );
        let names = names.to_vec();
        self.run_blocking(move |conn| fetch_rows(&conn, &sql, rusqlite::params_from_iter(names)))
            .await
    }

    async fn trials_by_name(&self, names: &[String]) -> StoreResult<Vec<Row>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        // Substring match: trial records append qualifiers to the name
        // ("... 40mg/0.8ml"), so equality would miss them.
        let predicate = (1..=names.len())
            .map(|i| format!("TRIM(LOWER(proprietaryname)) LIKE ?{i} ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT trial_idc_identifier, trial_external_identifier, proprietaryname, \
                    nonproprietaryname \
             FROM trial WHERE {predicate}"
        );
        let patterns: Vec<String> = names
            .iter()
            .map(|n| format!("%{}%", escape_like(n)))
            .collect();
        self.run_blocking(move |conn| fetch_rows(&conn, &sql, rusqlite::params_from_iter(patterns)))
            .await
    }

    async fn product_details(&self, productid: &str) -> StoreResult<Option<Row>> {
        let productid = productid.to_string();
        self.run_blocking(move |conn| {
            let rows = fetch_rows(
                &conn,
                "SELECT * FROM product WHERE productid = ?1 LIMIT 1",
                [productid],
            )?;
            Ok(rows.into_iter().next())
        })
        .await
    }

    async fn therapeutic_details(&self, productid: &str) -> StoreResult<Option<Row>> {
        let productid = productid.to_string();
        self.run_blocking(move |conn| {
            let rows = fetch_rows(
                &conn,
                "SELECT * FROM therapeutic WHERE productid = ?1 LIMIT 1",
                [productid],
            )?;
            Ok(rows.into_iter().next())
        })
        .await
    }

    async fn trial_details_for_product(&self, productid: &str) -> StoreResult<Option<Row>> {
        let productid = productid.to_string();
        self.run_blocking(move |conn| {
            let rows = fetch_rows(
                &conn,
                "SELECT * FROM trial WHERE proprietaryname IN \
                     (SELECT proprietaryname FROM product WHERE productid = ?1) \
                 LIMIT 1",
                [productid],
            )?;
            Ok(rows.into_iter().next())
        })
        .await
    }

    async fn package_details(&self, ndcpackagecode: &str) -> StoreResult<Option<Row>> {
        let code = ndcpackagecode.to_string();
        self.run_blocking(move |conn| {
            let rows = fetch_rows(
                &conn,
                "SELECT * FROM package WHERE ndcpackagecode = ?1 LIMIT 1",
                [code],
            )?;
            Ok(rows.into_iter().next())
        })
        .await
    }

    async fn all_main_rows(&self) -> StoreResult<Vec<Row>> {
        self.run_blocking(|conn| fetch_rows(&conn, "SELECT * FROM main", []))
            .await
    }
}
