//! Transformation module.
//!
//! This module handles CSV rows to design-token transformation:
//! - Grouper: mode extraction, anomaly detection, per-mode folding
//! - Naming: output file names
//! - Tokenizer: the `transform` entry point
//! - Pipeline: parse + transform + progress logs

pub mod grouper;
pub mod naming;
pub mod pipeline;
pub mod tokenizer;

pub use grouper::{detect_anomalies, extract_modes, fold_rows};
pub use naming::{safe_token_file_name, sanitize_segment, token_file_name};
pub use pipeline::*;
pub use tokenizer::{transform, transform_with_options, TransformOptions};
