//! Domain models for the csv-tokens pipeline.
//!
//! - [`Row`] - One parsed CSV line, keyed by header, in header order
//! - [`Token`] / [`TokenType`] - A single design token (`$value` / `$type`)
//! - [`TokenDocument`] - All tokens of one mode
//! - [`Manifest`] - Figma collection manifest
//! - [`ProcessedResult`] - Manifest plus every generated file
//! - [`AnomalyWarning`] - Non-fatal findings raised while transforming

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// File name of the manifest inside a result / bundle.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// File name of the zip bundle offered for download.
pub const ARCHIVE_FILE_NAME: &str = "processed-files.zip";

/// One parsed CSV line: column name to cell value, in header order.
///
/// Cells are JSON strings, numbers (when the parser sniffed a number) or null.
pub type Row = Map<String, Value>;

/// Whether a cell counts as blank: null, or a string with no visible content.
pub fn is_blank(cell: &Value) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Textual form of a cell, used to name modes.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Design token type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Number,
    String,
}

impl TokenType {
    /// `Number` exactly when the cell holds a JSON number.
    ///
    /// Numeric-looking strings stay `String`: the distinction comes from
    /// the parser (see [`crate::parser::ParseOptions::dynamic_typing`]).
    pub fn classify(cell: &Value) -> Self {
        if cell.is_number() {
            TokenType::Number
        } else {
            TokenType::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Number => "number",
            TokenType::String => "string",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single design token, serialized as `{ "$value": ..., "$type": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    #[serde(rename = "$value")]
    pub value: Value,
    #[serde(rename = "$type")]
    pub kind: TokenType,
}

impl Token {
    /// Lift a cell into a token, classifying it on the way.
    pub fn from_cell(cell: &Value) -> Self {
        Self {
            value: cell.clone(),
            kind: TokenType::classify(cell),
        }
    }

    /// JSON object form, `$value` first.
    pub fn into_value(self) -> Value {
        json!({
            "$value": self.value,
            "$type": self.kind.as_str(),
        })
    }
}

/// Tokens of one mode, keyed by column name.
///
/// Keys keep the order in which columns were first set while folding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TokenDocument(pub Map<String, Value>);

impl TokenDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the token for a column.
    pub fn set(&mut self, column: impl Into<String>, token: Token) {
        self.0.insert(column.into(), token.into_value());
    }

    /// Token for a column, if set.
    pub fn get(&self, column: &str) -> Option<Token> {
        self.0
            .get(column)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// Modes of one collection: mode name to the token files holding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectionEntry {
    pub modes: Map<String, Value>,
}

impl CollectionEntry {
    /// Files listed for a mode.
    pub fn files(&self, mode: &str) -> Vec<String> {
        self.modes
            .get(mode)
            .and_then(|v| v.as_array())
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| f.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Figma collection manifest.
///
/// ```json
/// { "name": "Theme", "collections": { "Theme": { "modes": { "Light": ["Theme.Light.tokens.json"] } } } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub name: String,
    pub collections: BTreeMap<String, CollectionEntry>,
}

impl Manifest {
    /// Build a manifest for one collection from `(mode, file name)` pairs.
    pub fn new<'a>(
        collection_name: &str,
        modes: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Self {
        let mut entry = CollectionEntry::default();
        for (mode, file) in modes {
            entry
                .modes
                .insert(mode.to_string(), Value::Array(vec![Value::String(file)]));
        }

        let mut collections = BTreeMap::new();
        collections.insert(collection_name.to_string(), entry);

        Self {
            name: collection_name.to_string(),
            collections,
        }
    }

    /// JSON form written to `manifest.json`.
    pub fn to_value(&self) -> Value {
        let collections: Map<String, Value> = self
            .collections
            .iter()
            .map(|(name, entry)| (name.clone(), json!({ "modes": entry.modes.clone() })))
            .collect();

        json!({
            "name": self.name,
            "collections": collections,
        })
    }

    /// The collection entry named like the manifest.
    pub fn collection(&self) -> Option<&CollectionEntry> {
        self.collections.get(&self.name)
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Non-fatal findings about mode values. They never change the output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnomalyWarning {
    /// Mode value parses as a number.
    NumericMode { mode: String },
    /// More than one row carries this mode value; rows are merged per column,
    /// later non-blank cells winning.
    RepeatedMode { mode: String, occurrences: usize },
}

impl fmt::Display for AnomalyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyWarning::NumericMode { mode } => {
                write!(f, "Mode value '{}' is numeric", mode)
            }
            AnomalyWarning::RepeatedMode { mode, occurrences } => write!(
                f,
                "Mode value '{}' appears in {} rows; the last non-blank value of each column wins",
                mode, occurrences
            ),
        }
    }
}

// =============================================================================
// Processed Result
// =============================================================================

/// Everything one run produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    /// Mode key column(s) as selected; only the first one is used.
    pub modes_key: Vec<String>,
    /// Modes in first-seen order.
    pub modes: Vec<String>,
    /// `manifest.json` plus one entry per emitted token file.
    pub json_files: BTreeMap<String, Value>,
    pub manifest: Manifest,
    #[serde(default)]
    pub warnings: Vec<AnomalyWarning>,
}

impl ProcessedResult {
    /// Token document for a generated file name.
    pub fn document(&self, file_name: &str) -> Option<TokenDocument> {
        if file_name == MANIFEST_FILE_NAME {
            return None;
        }
        self.json_files
            .get(file_name)
            .and_then(|v| v.as_object())
            .map(|obj| TokenDocument(obj.clone()))
    }

    /// Token file names in mode order (elided documents skipped).
    pub fn token_file_names(&self) -> Vec<String> {
        let Some(entry) = self.manifest.collection() else {
            return Vec::new();
        };
        self.modes
            .iter()
            .flat_map(|mode| entry.files(mode))
            .filter(|file| self.json_files.contains_key(file))
            .collect()
    }
}
