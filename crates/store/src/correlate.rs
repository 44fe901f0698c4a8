//! The cross-reference correlator.
//!
//! Runs a filter against the `main` table, derives join keys from the
//! matches (product identifiers, package codes, normalized proprietary
//! names), and fans out to the four related tables to assemble the
//! composite five-bucket response.
//!
//! The two proprietary-name joins are deliberately asymmetric: therapeutic
//! records match on normalized *equality*, trial records on normalized
//! *substring*. Both are fuzzier than a foreign key because the source
//! tables have none.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{BackendError, StoreError, StoreResult};
use crate::filter::FilterSpec;
use crate::store::ReferenceStore;
use crate::tables::{Row, Table};

/// The five-bucket composite search response.
///
/// Buckets are optional because one edge case leaves most of them unset:
/// when the matched main rows carry no usable proprietary name, only an
/// empty `therapeutic` bucket is returned.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CompositeResult {
    /// Matched rows from the `main` table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<Vec<Row>>,
    /// Product rows joined by `productid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Vec<Row>>,
    /// Package rows joined by `ndcpackagecode`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<Vec<Row>>,
    /// Therapeutic rows joined by normalized-name equality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapeutic: Option<Vec<Row>>,
    /// Trial rows joined by normalized-name substring match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immunogenicity: Option<Vec<Row>>,
}

impl CompositeResult {
    /// All five buckets present and empty (the zero-match response).
    pub fn empty() -> Self {
        Self {
            main: Some(Vec::new()),
            product: Some(Vec::new()),
            package: Some(Vec::new()),
            therapeutic: Some(Vec::new()),
            immunogenicity: Some(Vec::new()),
        }
    }
}

/// Runs the composite search.
///
/// The four downstream lookups are independent reads and run concurrently;
/// each is bounded by `lookup_timeout`, and a timeout fails the whole
/// operation the same way a query error does. There is no partial-results
/// contract.
pub async fn search_composite<S>(
    store: &S,
    filter: &FilterSpec,
    lookup_timeout: Duration,
) -> StoreResult<CompositeResult>
where
    S: ReferenceStore + ?Sized,
{
    let main = store.search(Table::Main, filter).await?;
    if main.is_empty() {
        // Short-circuit: no join keys, so the downstream lookups are never
        // issued.
        return Ok(CompositeResult::empty());
    }

    // Identifier lists keep duplicates; the IN-lists tolerate them and
    // only the name set is deduplicated.
    let product_ids = collect_values(&main, "productid");
    let package_codes = collect_values(&main, "ndcpackagecode");
    let names = normalized_names(&main);

    debug!(
        matches = main.len(),
        products = product_ids.len(),
        packages = package_codes.len(),
        names = names.len(),
        "correlating main matches"
    );

    if names.is_empty() {
        // Without a single usable proprietary name only the therapeutic
        // bucket is populated (empty); the other buckets stay unset.
        return Ok(CompositeResult {
            therapeutic: Some(Vec::new()),
            ..CompositeResult::default()
        });
    }

    let (product, package, therapeutic, immunogenicity) = tokio::try_join!(
        bounded(
            store.products_by_id(&product_ids),
            lookup_timeout,
            "product lookup",
        ),
        bounded(
            store.packages_by_code(&package_codes),
            lookup_timeout,
            "package lookup",
        ),
        bounded(
            store.therapeutics_by_name(&names),
            lookup_timeout,
            "therapeutic lookup",
        ),
        bounded(
            store.trials_by_name(&names),
            lookup_timeout,
            "immunogenicity lookup",
        ),
    )?;

    Ok(CompositeResult {
        main: Some(main),
        product: Some(product),
        package: Some(package),
        therapeutic: Some(therapeutic),
        immunogenicity: Some(immunogenicity),
    })
}

/// Wraps a lookup future in a bounded timeout.
async fn bounded<F>(
    lookup: F,
    timeout: Duration,
    operation: &'static str,
) -> StoreResult<Vec<Row>>
where
    F: Future<Output = StoreResult<Vec<Row>>>,
{
    match tokio::time::timeout(timeout, lookup).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Backend(BackendError::Timeout {
            operation,
            timeout_ms: timeout.as_millis() as u64,
        })),
    }
}

/// Non-null string values of one column across all rows, duplicates kept.
fn collect_values(rows: &[Row], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter_map(|value| value.as_str())
        .map(|s| s.to_string())
        .collect()
}

/// Trimmed, lowercased, deduplicated proprietary names; nulls and values
/// that are blank after trimming are dropped (a blank join key would
/// substring-match every trial row).
///
/// Normalization is ASCII-only on purpose: the SQL side of the join uses
/// SQLite's `TRIM`/`LOWER`, which strip spaces and fold ASCII letters and
/// nothing else, and both sides must produce the same key.
fn normalized_names(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for row in rows {
        let Some(name) = row.get("proprietaryname").and_then(|v| v.as_str()) else {
            continue;
        };
        let normalized = name.trim_matches(' ').to_ascii_lowercase();
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.clone()) {
            names.push(normalized);
        }
    }
    names
}
