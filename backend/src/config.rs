//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the CLI
//! through `dotenvy`); CLI flags override them.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CSV_TOKENS_PORT` | `3000` |
//! | `CSV_TOKENS_MAX_UPLOAD_BYTES` | `10485760` (10 MiB) |
//! | `CSV_TOKENS_DYNAMIC_TYPING` | `true` |

use std::env;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upload limit in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Sniff numeric cells while parsing
    pub dynamic_typing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            dynamic_typing: true,
        }
    }
}

impl Config {
    /// Read the process environment. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: lookup("CSV_TOKENS_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            max_upload_bytes: lookup("CSV_TOKENS_MAX_UPLOAD_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            dynamic_typing: lookup("CSV_TOKENS_DYNAMIC_TYPING")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.dynamic_typing),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
