//! The token transformer: parsed rows plus a mode column in,
//! manifest plus token documents out.
//!
//! Pure and synchronous. No I/O, no shared state: every call recomputes
//! the full result from its inputs.

use std::collections::{BTreeMap, HashSet};

use super::grouper::{detect_anomalies, extract_modes, fold_rows, rows_for_mode};
use super::naming::{safe_token_file_name, token_file_name, MANIFEST_FILE_NAME};
use crate::error::{TransformError, TransformResult};
use crate::models::{Manifest, ProcessedResult, Row};

/// Options for [`transform_with_options`].
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Selected mode column(s). Only the first one is used.
    pub mode_keys: Vec<String>,
    /// Collection name; defaults to the mode column name.
    pub collection_name: Option<String>,
    /// Header line of the CSV. When `None`, every column seen in a row counts.
    pub headers: Option<Vec<String>>,
    /// Replace path separators in file names.
    pub sanitize_file_names: bool,
}

impl TransformOptions {
    /// Options for a single mode column.
    pub fn new(mode_key: impl Into<String>) -> Self {
        Self {
            mode_keys: vec![mode_key.into()],
            ..Self::default()
        }
    }

    /// Accept a comma-separated selection such as `"Theme, Language"`.
    pub fn with_mode_keys_str(mut self, keys: &str) -> Self {
        self.mode_keys = keys
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn sanitized(mut self, sanitize: bool) -> Self {
        self.sanitize_file_names = sanitize;
        self
    }

    /// The mode column actually used.
    pub fn mode_key(&self) -> Option<&str> {
        self.mode_keys.first().map(String::as_str)
    }
}

/// Transform rows into a token collection.
///
/// `collection_name` names the manifest collection and prefixes every file.
///
/// A mode whose rows carry nothing besides the mode column keeps its
/// manifest entry but gets no token file.
///
/// # Errors
/// - [`TransformError::EmptyInput`] when `rows` is empty
/// - [`TransformError::InvalidModeKey`] when no row has the `mode_key` column
pub fn transform(
    rows: &[Row],
    mode_key: &str,
    collection_name: &str,
) -> TransformResult<ProcessedResult> {
    let options = TransformOptions::new(mode_key).with_collection_name(collection_name);
    transform_with_options(rows, &options)
}

/// Transform rows with full control over key selection, headers and naming.
pub fn transform_with_options(
    rows: &[Row],
    options: &TransformOptions,
) -> TransformResult<ProcessedResult> {
    if rows.is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let mode_key = options.mode_key().ok_or(TransformError::NoModeKey)?;

    let available = match &options.headers {
        Some(headers) => headers.clone(),
        None => observed_columns(rows),
    };
    if !available.iter().any(|h| h == mode_key) {
        return Err(TransformError::InvalidModeKey {
            column: mode_key.to_string(),
            available,
        });
    }

    let collection_name = options
        .collection_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(mode_key);

    let modes = extract_modes(rows, mode_key);
    let warnings = detect_anomalies(rows, mode_key);

    let mut used_names = HashSet::new();
    let mut files: Vec<(String, String)> = Vec::with_capacity(modes.len());
    for mode in &modes {
        let file_name = if options.sanitize_file_names {
            unique_name(&mut used_names, collection_name, mode)
        } else {
            token_file_name(collection_name, mode)
        };
        files.push((mode.clone(), file_name));
    }

    let mut json_files = BTreeMap::new();
    for (mode, file_name) in &files {
        let document = fold_rows(rows_for_mode(rows, mode_key, mode));
        // The mode cell alone carries no data.
        if document.columns().all(|column| column == mode_key) {
            continue;
        }
        json_files.insert(file_name.clone(), serde_json::Value::Object(document.0));
    }

    let manifest = Manifest::new(
        collection_name,
        files.iter().map(|(mode, file)| (mode.as_str(), file.clone())),
    );
    json_files.insert(MANIFEST_FILE_NAME.to_string(), manifest.to_value());

    Ok(ProcessedResult {
        modes_key: options.mode_keys.clone(),
        modes,
        json_files,
        manifest,
        warnings,
    })
}

/// Column names seen across all rows, in first-seen order.
fn observed_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.keys() {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

/// Sanitized file name, suffixed until it no longer collides with an earlier mode.
fn unique_name(used: &mut HashSet<String>, collection_name: &str, mode: &str) -> String {
    let mut name = safe_token_file_name(collection_name, mode);
    let mut n = 2;
    while used.contains(&name) {
        name = safe_token_file_name(collection_name, &format!("{}_{}", mode, n));
        n += 1;
    }
    used.insert(name.clone());
    name
}
