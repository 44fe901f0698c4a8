//! # bioref-export — record-set download formatting
//!
//! Converts an in-memory record set (ordered column-name maps, the shape
//! the store returns) into CSV, JSON, or XLSX bytes for download
//! responses.
//!
//! Column ordering for the tabular formats comes from the first record's
//! key order; records missing a column emit an empty cell, and keys that
//! only appear in later records are ignored. JSON preserves each record
//! mapping verbatim. Empty input is a valid empty document, never an
//! error.

#![warn(missing_docs)]

use std::str::FromStr;

use rust_xlsxwriter::Workbook;
use serde_json::Value;
use thiserror::Error;

/// One exported record: an ordered column-name map.
pub type Record = serde_json::Map<String, Value>;

/// Errors raised while formatting a download.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The requested format is not one of csv/json/spreadsheet.
    #[error("invalid export format: {format}")]
    UnknownFormat {
        /// The rejected format string.
        format: String,
    },

    /// CSV serialization failed.
    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Workbook generation failed.
    #[error("spreadsheet generation failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

/// Supported download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// A JSON array of the records as-is.
    Json,
    /// A single-worksheet XLSX workbook.
    Spreadsheet,
}

impl ExportFormat {
    /// MIME type for the response.
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Default download filename.
    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Csv => "data.csv",
            ExportFormat::Json => "data.json",
            ExportFormat::Spreadsheet => "data.xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "spreadsheet" | "xlsx" | "excel" => Ok(ExportFormat::Spreadsheet),
            other => Err(ExportError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// A formatted download: bytes plus the response metadata for the
/// `Content-Type` and `Content-Disposition` headers.
#[derive(Debug, Clone)]
pub struct Export {
    /// Document bytes.
    pub bytes: Vec<u8>,
    /// MIME type.
    pub content_type: &'static str,
    /// Filename hint.
    pub filename: &'static str,
}

/// Formats `records` as `format`.
pub fn export(records: &[Record], format: ExportFormat) -> Result<Export, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(records)?,
        ExportFormat::Json => serde_json::to_vec_pretty(records)?,
        ExportFormat::Spreadsheet => to_xlsx(records, "data")?,
    };
    Ok(Export {
        bytes,
        content_type: format.content_type(),
        filename: format.filename(),
    })
}

/// Formats `records` as an XLSX workbook with a named worksheet.
///
/// Used directly by the whole-table download, which names its worksheet
/// and file after the table.
pub fn to_xlsx(records: &[Record], sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    if let Some(first) = records.first() {
        let headers: Vec<&String> = first.keys().collect();
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, header.as_str())?;
        }
        for (row_idx, record) in records.iter().enumerate() {
            let row = (row_idx + 1) as u32;
            for (col, header) in headers.iter().enumerate() {
                let col = col as u16;
                match record.get(header.as_str()) {
                    Some(Value::Number(n)) if n.is_f64() => {
                        worksheet.write_number(row, col, n.as_f64().unwrap_or_default())?;
                    }
                    Some(Value::Number(n)) => {
                        worksheet.write_number(row, col, n.as_i64().unwrap_or_default() as f64)?;
                    }
                    Some(value) => {
                        worksheet.write_string(row, col, cell_text(value))?;
                    }
                    None => {}
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn to_csv(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if let Some(first) = records.first() {
        let headers: Vec<&String> = first.keys().collect();
        writer.write_record(headers.iter().map(|h| h.as_str()))?;
        for record in records {
            let row: Vec<String> = headers
                .iter()
                .map(|h| record.get(h.as_str()).map(cell_text).unwrap_or_default())
                .collect();
            writer.write_record(&row)?;
        }
    }

    writer.into_inner().map_err(|e| {
        ExportError::Csv(csv::Error::from(std::io::Error::other(e.to_string())))
    })
}

/// Renders one JSON value as cell text. Strings are used verbatim, null is
/// blank, anything else falls back to its JSON rendering.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
