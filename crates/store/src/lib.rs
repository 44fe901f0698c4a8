//! # bioref-store — reference-data access layer
//!
//! This crate owns everything between the HTTP layer and the reference
//! database for the bioref search service:
//!
//! - [`tables`] — the closed enumeration of the five reference tables
//!   (`main`, `product`, `package`, `therapeutic`, `trial`) and their
//!   column allow-lists. Caller-supplied field and table names are
//!   validated here before they can reach SQL text.
//! - [`filter`] — the filter clause builder: ordered `(field, value,
//!   AND/OR)` terms to a parameterized contains-predicate, chained strictly
//!   left to right with no boolean precedence.
//! - [`store`] — the async [`ReferenceStore`] trait the REST layer is
//!   generic over.
//! - [`sqlite`] — the pooled SQLite implementation.
//! - [`correlate`] — the cross-reference correlator assembling the
//!   five-bucket composite search response with a concurrent, time-bounded
//!   fan-out.
//! - [`schema`] — idempotent schema bootstrap so `:memory:` databases
//!   behave like provisioned ones.
//!
//! The dataset is externally owned and read-only from this service's point
//! of view; [`sqlite::SqliteStore::load_rows`] exists only as a loading aid
//! for tests and import scripts.

#![warn(missing_docs)]

pub mod correlate;
pub mod error;
pub mod filter;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod tables;

pub use correlate::{CompositeResult, search_composite};
pub use error::{BackendError, FilterError, StoreError, StoreResult};
pub use filter::{Combinator, FilterSpec, FilterTerm, SqlFilter};
pub use sqlite::{SqliteStore, SqliteStoreConfig};
pub use store::ReferenceStore;
pub use tables::{Row, Table};
