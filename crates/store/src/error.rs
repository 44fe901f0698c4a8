//! Error types for the reference-data store.
//!
//! Errors are split into two categories that the HTTP layer maps onto
//! distinct status classes:
//!
//! | Category | Meaning | HTTP mapping |
//! |----------|---------|--------------|
//! | [`FilterError`] | caller-supplied field/table/combinator rejected | 400 |
//! | [`BackendError`] | the database lookup itself failed | 500 |

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Caller-supplied filter input was rejected.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The underlying database operation failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised while validating caller-supplied query input.
///
/// Field and table names arrive from the client and are checked against the
/// closed allow-lists in [`crate::tables`] before any SQL text is produced.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The named table is not one of the five reference tables.
    #[error("unknown table: {name}")]
    UnknownTable { name: String },

    /// The field is not a column of the target table.
    #[error("unknown field '{field}' for table {table}")]
    UnknownField { table: &'static str, field: String },

    /// The combinator was neither AND nor OR.
    #[error("unknown combinator: {value}")]
    UnknownCombinator { value: String },
}

/// Errors raised by the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// A pooled connection could not be acquired.
    #[error("failed to acquire database connection: {message}")]
    ConnectionFailed { message: String },

    /// A query failed to prepare or execute.
    #[error("query failed: {message}")]
    QueryFailed { message: String },

    /// A downstream lookup exceeded its time budget.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: &'static str, timeout_ms: u64 },
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
