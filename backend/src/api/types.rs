//! REST API types for frontend integration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{AnomalyWarning, Manifest};
use crate::transform::pipeline::{format_delimiter, CsvInfo, ProcessOutput};

/// Response to `/api/headers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadersResponse {
    pub job_id: String,
    pub status: String,
    pub csv_info: CsvMetadata,
}

impl From<CsvInfo> for HeadersResponse {
    fn from(info: CsvInfo) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            csv_info: CsvMetadata::from(info),
        }
    }
}

/// Response to `/api/process`: the processed result as the browser shows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub job_id: String,

    /// "ready" or "warning"
    pub status: String,

    pub modes_key: Vec<String>,
    pub modes: Vec<String>,
    pub manifest: Manifest,

    /// File name to JSON content, `manifest.json` included
    pub json_files: serde_json::Map<String, Value>,

    pub warnings: Vec<AnomalyWarning>,
    pub csv_info: CsvMetadata,
}

impl From<ProcessOutput> for ProcessResponse {
    fn from(output: ProcessOutput) -> Self {
        let ProcessOutput { result, csv_info } = output;
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if result.warnings.is_empty() { "ready" } else { "warning" }.to_string(),
            modes_key: result.modes_key,
            modes: result.modes,
            manifest: result.manifest,
            json_files: result.json_files.into_iter().collect(),
            warnings: result.warnings,
            csv_info: CsvMetadata::from(csv_info),
        }
    }
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<CsvInfo> for CsvMetadata {
    fn from(info: CsvInfo) -> Self {
        Self {
            encoding: info.encoding,
            delimiter: format_delimiter(info.delimiter),
            row_count: info.row_count,
            columns: info.headers,
        }
    }
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pipeline::{process_bytes, ProcessOptions};

    #[test]
    fn test_process_response_from_output() {
        let csv = "Mode,Size\n1,4\n2,8\nDark,12\n";
        let output = process_bytes(csv.as_bytes(), &ProcessOptions::for_mode_key("Mode")).unwrap();

        let response = ProcessResponse::from(output);
        assert_eq!(response.status, "warning");
        assert_eq!(response.modes, vec!["1", "2", "Dark"]);
        assert!(response.json_files.contains_key("manifest.json"));
        assert_eq!(response.csv_info.columns, vec!["Mode", "Size"]);

        let value = serde_json::to_value(&response).unwrap();
        assert!(value["jsonFiles"]["Mode.Dark.tokens.json"]["Size"].is_object());
        assert_eq!(value["modesKey"], json!(["Mode"]));
    }

    #[test]
    fn test_csv_metadata_tab() {
        let meta = CsvMetadata::from(CsvInfo {
            encoding: "utf-8".into(),
            delimiter: '\t',
            headers: vec!["a".into()],
            row_count: 0,
        });
        assert_eq!(meta.delimiter, "TAB");
    }

    #[test]
    fn test_error_response() {
        let body = error_response("Mode key column 'X' not found");
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("'X'"));
    }
}
