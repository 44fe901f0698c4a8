//! The storage trait the HTTP layer is generic over.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::filter::FilterSpec;
use crate::tables::{Row, Table};

/// Read-only access to the five reference tables.
///
/// All reference data is externally owned; implementations only read.
/// Zero matching rows is always `Ok` with an empty collection, never an
/// error.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// A short name for the backing engine, used in health responses and
    /// log lines.
    fn backend_name(&self) -> &'static str;

    /// Verifies the backing database is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    /// Runs a filter against one table and returns the matching rows.
    ///
    /// No default ordering and no limit: an empty filter returns the whole
    /// table.
    async fn search(&self, table: Table, filter: &FilterSpec) -> StoreResult<Vec<Row>>;

    /// Returns ranked value completions for a `main` column.
    ///
    /// An empty prefix returns an empty list without touching the
    /// database. Results are distinct non-blank values with a
    /// case-insensitive prefix match, ordered by `(length, value)`
    /// ascending and capped at 50.
    async fn suggest(&self, field: &str, prefix: &str) -> StoreResult<Vec<String>>;

    /// Product rows whose `productid` appears in `ids`.
    async fn products_by_id(&self, ids: &[String]) -> StoreResult<Vec<Row>>;

    /// Package rows whose `ndcpackagecode` appears in `codes`.
    async fn packages_by_code(&self, codes: &[String]) -> StoreResult<Vec<Row>>;

    /// Therapeutic rows whose normalized proprietary name exactly equals a
    /// member of `names` (which must already be trimmed and lowercased).
    async fn therapeutics_by_name(&self, names: &[String]) -> StoreResult<Vec<Row>>;

    /// Trial rows whose normalized proprietary name *contains* a member of
    /// `names` — deliberately weaker than the therapeutic linkage.
    async fn trials_by_name(&self, names: &[String]) -> StoreResult<Vec<Row>>;

    /// First product row for a product identifier.
    async fn product_details(&self, productid: &str) -> StoreResult<Option<Row>>;

    /// First therapeutic row carrying this product identifier.
    async fn therapeutic_details(&self, productid: &str) -> StoreResult<Option<Row>>;

    /// First trial row whose proprietary name matches one of the product's
    /// proprietary names.
    async fn trial_details_for_product(&self, productid: &str) -> StoreResult<Option<Row>>;

    /// First package row for a package code.
    async fn package_details(&self, ndcpackagecode: &str) -> StoreResult<Option<Row>>;

    /// The entire `main` table, for the export-all download.
    async fn all_main_rows(&self) -> StoreResult<Vec<Row>>;
}
