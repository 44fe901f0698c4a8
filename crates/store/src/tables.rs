//! The closed enumeration of reference tables and their column allow-lists.
//!
//! Field and table names reach this crate from caller-controlled input. They
//! are never interpolated into SQL text until they have been resolved against
//! the static column lists below, so a request can only ever name columns
//! that actually exist in the reference schema.

use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;

/// A row from any reference table, keyed by column name.
///
/// Rows are dynamic maps rather than structs because the reference tables
/// are wide, sparsely populated, and rendered generically by the client.
/// With serde_json's `preserve_order` feature the map keeps column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The five reference tables exposed to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Denormalized search table keyed by `(productid, ndcpackagecode)`.
    Main,
    /// Drug products keyed by `productid`.
    Product,
    /// Drug packages keyed by `ndcpackagecode`.
    Package,
    /// Therapeutic / biosimilar audit records keyed by `t_id`.
    Therapeutic,
    /// Clinical-trial immunogenicity records.
    Trial,
}

impl Table {
    /// All tables, in presentation order.
    pub const ALL: [Table; 5] = [
        Table::Main,
        Table::Product,
        Table::Package,
        Table::Therapeutic,
        Table::Trial,
    ];

    /// The SQL table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Main => "main",
            Table::Product => "product",
            Table::Package => "package",
            Table::Therapeutic => "therapeutic",
            Table::Trial => "trial",
        }
    }

    /// The column allow-list for this table.
    ///
    /// This is the full set of columns a filter or suggestion request may
    /// name. It doubles as the schema definition in [`crate::schema`].
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Main => &[
                "productid",
                "productndc",
                "ndcpackagecode",
                "proprietaryname",
                "nonproprietaryname",
                "unii",
                "producttypename",
                "labelername",
            ],
            Table::Product => &[
                "productid",
                "productndc",
                "producttypename",
                "proprietaryname",
                "nonproprietaryname",
                "dosageformname",
                "routename",
                "substancename",
                "pharm_classes",
                "marketingcategoryname",
                "applicationnumber",
                "labelername",
            ],
            Table::Package => &[
                "ndcpackagecode",
                "productid",
                "productndc",
                "packagedescription",
                "startmarketingdate",
                "endmarketingdate",
            ],
            Table::Therapeutic => &[
                "t_id",
                "audit_status",
                "inn_name",
                "proprietaryname",
                "nonproprietaryname",
                "generic_proper_name",
                "unii",
                "productid",
                "ndcpackagecode",
                "fda_approved",
                "first_fda_approval",
                "marketing_category",
                "application_number",
                "company",
                "manufacturer",
                "labelled_as_biosimilar",
                "expression_system",
                "moa",
            ],
            Table::Trial => &[
                "trial_idc_identifier",
                "trial_external_identifier",
                "proprietaryname",
                "nonproprietaryname",
                "disease_indication_category",
                "immunogenicity_testing",
                "antibody",
                "target",
            ],
        }
    }

    /// Resolves a caller-supplied column name against this table's
    /// allow-list, returning the static column name on success.
    pub fn resolve_column(self, field: &str) -> Result<&'static str, FilterError> {
        self.columns()
            .iter()
            .find(|c| **c == field)
            .copied()
            .ok_or_else(|| FilterError::UnknownField {
                table: self.name(),
                field: field.to_string(),
            })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Table::Main),
            "product" => Ok(Table::Product),
            "package" => Ok(Table::Package),
            "therapeutic" => Ok(Table::Therapeutic),
            // The trial table holds the immunogenicity records; accept the
            // presentation name too.
            "trial" | "immunogenicity" => Ok(Table::Trial),
            other => Err(FilterError::UnknownTable {
                name: other.to_string(),
            }),
        }
    }
}
