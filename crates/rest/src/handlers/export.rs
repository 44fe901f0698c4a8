//! Download handlers: format the caller's records, or the whole `main`
//! table, as a file attachment.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use bioref_export::{ExportFormat, Record, to_xlsx};
use bioref_store::ReferenceStore;

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// Body of the download endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    /// The records to format, exactly as the client received them.
    pub records: Option<Value>,
    /// Requested format: csv, json, or spreadsheet.
    #[serde(default)]
    pub format: String,
}

/// POST /export
///
/// Formats the records the client already holds as a downloadable file.
/// The records must be a JSON array of objects; anything else is rejected
/// before the format is even looked at.
pub async fn export_records(
    axum::Json(request): axum::Json<ExportRequest>,
) -> RestResult<Response> {
    let records = parse_records(request.records)?;
    let format: ExportFormat = request.format.parse()?;

    debug!(records = records.len(), ?format, "formatting download");
    let export = bioref_export::export(&records, format)?;
    Ok(attachment(export.bytes, export.content_type, export.filename))
}

/// GET /export/main
///
/// The entire `main` table as an XLSX workbook.
pub async fn export_main<S: ReferenceStore>(
    State(state): State<AppState<S>>,
) -> RestResult<Response> {
    let rows = state.store().all_main_rows().await?;
    debug!(rows = rows.len(), "exporting main table");
    let bytes = to_xlsx(&rows, "main")
        .map_err(|e| RestError::Upstream { message: e.to_string() })?;
    Ok(attachment(
        bytes,
        ExportFormat::Spreadsheet.content_type(),
        "main.xlsx",
    ))
}

fn parse_records(records: Option<Value>) -> RestResult<Vec<Record>> {
    let invalid = || RestError::bad_request("Invalid data for download");
    let Some(Value::Array(items)) = records else {
        return Err(invalid());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            _ => Err(invalid()),
        })
        .collect()
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_records_accepts_object_array() {
        let records = parse_records(Some(json!([{"a": "1"}, {"a": "2"}]))).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_records_rejects_missing() {
        assert!(matches!(
            parse_records(None),
            Err(RestError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        assert!(parse_records(Some(json!({"a": "1"}))).is_err());
        assert!(parse_records(Some(json!("csv"))).is_err());
    }

    #[test]
    fn test_parse_records_rejects_scalar_elements() {
        assert!(parse_records(Some(json!([1, 2, 3]))).is_err());
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_records(Some(json!([]))).unwrap().is_empty());
    }
}
