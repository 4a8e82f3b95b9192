//! HTTP API module.
//!
//! - [`server`] - Axum router and handlers
//! - [`types`] - Response bodies
//! - [`logs`] - Progress log broadcasting (stdout + SSE)

pub mod logs;
pub mod server;
pub mod types;

pub use logs::{log_error, log_info, log_success, log_warning, LogEntry, LogLevel, LOG_BROADCASTER};
pub use server::{router, start_server};
pub use types::{error_response, CsvMetadata, HeadersResponse, ProcessResponse};
