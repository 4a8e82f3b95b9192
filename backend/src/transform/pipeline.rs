//! High-level pipeline API: parse, transform, report.
//!
//! # Example
//!
//! ```rust,ignore
//! use csv_tokens::{process_file, ProcessOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ProcessOptions::for_mode_key("Theme");
//!     let output = process_file(Path::new("themes.csv"), &options)?;
//!
//!     println!("Generated {} modes", output.result.modes.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::tokenizer::{transform_with_options, TransformOptions};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineError;
use crate::models::ProcessedResult;
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseOptions, ParseResult};

/// Options for a full run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub parse: ParseOptions,
    pub transform: TransformOptions,
}

impl ProcessOptions {
    /// Default parsing, single mode column.
    pub fn for_mode_key(mode_key: impl Into<String>) -> Self {
        Self {
            parse: ParseOptions::default(),
            transform: TransformOptions::new(mode_key),
        }
    }

    /// Parse options with the mode column kept as source text, so `01`,
    /// `1` and `1.50` stay three modes.
    fn parse_options(&self) -> ParseOptions {
        let mut parse = self.parse.clone();
        if let Some(key) = self.transform.mode_key() {
            if !parse.untyped_columns.iter().any(|c| c == key) {
                parse.untyped_columns.push(key.to_string());
            }
        }
        parse
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for CsvInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
        }
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    pub result: ProcessedResult,
    pub csv_info: CsvInfo,
}

/// Header step: parse and describe the CSV without transforming it.
pub fn analyze_bytes(bytes: &[u8], options: &ParseOptions) -> Result<CsvInfo, PipelineError> {
    let parsed = parse_bytes_auto(bytes, options)?;
    let info = CsvInfo::from(&parsed);
    log_csv_info(&info);
    Ok(info)
}

/// Transform a CSV file.
pub fn process_file(path: &Path, options: &ProcessOptions) -> Result<ProcessOutput, PipelineError> {
    log_info(format!("📖 Reading {}", path.display()));
    let parsed = parse_csv_file_auto(path, &options.parse_options())?;
    process_parsed(parsed, options)
}

/// Transform CSV bytes (uploaded or pasted).
pub fn process_bytes(bytes: &[u8], options: &ProcessOptions) -> Result<ProcessOutput, PipelineError> {
    log_info(format!("📖 Reading {} bytes of CSV", bytes.len()));
    let parsed = parse_bytes_auto(bytes, &options.parse_options())?;
    process_parsed(parsed, options)
}

fn process_parsed(parsed: ParseResult, options: &ProcessOptions) -> Result<ProcessOutput, PipelineError> {
    let csv_info = CsvInfo::from(&parsed);
    log_csv_info(&csv_info);

    let mut transform_options = options.transform.clone();
    if transform_options.headers.is_none() {
        transform_options.headers = Some(parsed.headers.clone());
    }

    if let Some(key) = transform_options.mode_key() {
        log_info(format!("🔄 Grouping rows by '{}'...", key));
    }
    if transform_options.mode_keys.len() > 1 {
        log_warning(format!(
            "{} mode columns selected; only '{}' is used",
            transform_options.mode_keys.len(),
            transform_options.mode_keys[0]
        ));
    }

    let result = transform_with_options(&parsed.records, &transform_options)?;

    for warning in &result.warnings {
        log_warning(warning.to_string());
    }

    let emitted = result.token_file_names().len();
    log_success(format!(
        "{} modes, {} token files",
        result.modes.len(),
        emitted
    ));
    if emitted < result.modes.len() {
        log_warning(format!(
            "{} modes had no data and produced no token file",
            result.modes.len() - emitted
        ));
    }

    Ok(ProcessOutput { result, csv_info })
}

fn log_csv_info(info: &CsvInfo) {
    log_success(format!("Detected encoding: {}", info.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(info.delimiter)));
    log_success(format!("Read {} rows", info.row_count));
    log_info(format!("📋 CSV has {} columns:", info.headers.len()));
    for header in &info.headers {
        log_info_indent(format!("- {}", header), 1);
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
