//! # csv-tokens - CSV tables to Figma design-token collections
//!
//! One column of the CSV (the *mode key*) names the Figma modes, every other
//! column becomes a token. Each mode gets its own `{collection}.{mode}.tokens.json`
//! file and a `manifest.json` ties them into one collection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│  manifest + │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (by mode)   │     │ token files │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csv_tokens::{process_bytes, ProcessOptions};
//!
//! let csv = "Theme,Color\nLight,#ffffff\nDark,#000000\n";
//! let output = process_bytes(csv.as_bytes(), &ProcessOptions::for_mode_key("Theme")).unwrap();
//! println!("{} modes", output.result.modes.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Domain models (Row, Token, Manifest, ProcessedResult)
//! - [`config`] - Environment configuration
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Grouping, tokenizing and pipeline
//! - [`archive`] - File output and zip bundle
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod archive;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ArchiveError, CsvError, PipelineError, ServerError, TransformError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AnomalyWarning, Manifest, ProcessedResult, Row, Token, TokenDocument, TokenType,
    ARCHIVE_FILE_NAME, MANIFEST_FILE_NAME,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_all, parse_bytes_auto,
    parse_csv_file_auto, parse_header, ParseOptions, ParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    sanitize_segment, token_file_name, transform, transform_with_options, TransformOptions,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    analyze_bytes, process_bytes, process_file, CsvInfo, ProcessOptions, ProcessOutput,
};

// =============================================================================
// Re-exports - Archive
// =============================================================================

pub use archive::{bundle, file_contents, write_bundle, write_files};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
