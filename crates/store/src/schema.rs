//! Schema bootstrap for the SQLite backend.
//!
//! The reference tables are normally loaded out of band; this module only
//! guarantees they exist so `:memory:` databases (tests, local runs) behave
//! like a provisioned one. All columns are TEXT — the dataset is exported
//! from spreadsheets and identifiers like NDC codes are not numeric.

use rusqlite::Connection;

use crate::tables::Table;

/// Creates the five reference tables and their join-key indexes.
///
/// Idempotent: safe to call on every startup.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    for table in Table::ALL {
        let columns = table
            .columns()
            .iter()
            .map(|c| format!("{c} TEXT"))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS {} ({})", table.name(), columns),
            [],
        )?;
    }

    // Join keys used by the cross-reference fan-out.
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_main_productid ON main (productid);
         CREATE INDEX IF NOT EXISTS idx_main_ndcpackagecode ON main (ndcpackagecode);
         CREATE INDEX IF NOT EXISTS idx_product_productid ON product (productid);
         CREATE INDEX IF NOT EXISTS idx_package_ndcpackagecode ON package (ndcpackagecode);
         CREATE INDEX IF NOT EXISTS idx_therapeutic_productid ON therapeutic (productid);
         CREATE INDEX IF NOT EXISTS idx_therapeutic_name_norm
             ON therapeutic (TRIM(LOWER(proprietaryname)));",
    )?;

    Ok(())
}
