//! Environment variable configuration for the demo
//!
//! Connection credentials come from the environment (optionally seeded from a
//! `.env` file by the binary) with defaults that open a local database file.

use rowid_db::ConnectParams;
use std::env;
use std::str::FromStr;

pub const MAIN_USER: &str = "ROWID_DEMO_MAIN_USER";
pub const MAIN_PASSWORD: &str = "ROWID_DEMO_MAIN_PASSWORD";
pub const CONNECT_STRING: &str = "ROWID_DEMO_CONNECT_STRING";
pub const CONNECT_TIMEOUT_SECONDS: &str = "ROWID_DEMO_CONNECT_TIMEOUT_SECONDS";

/// Get the session user from environment or use default
pub fn main_user() -> String {
    env::var(MAIN_USER).unwrap_or_else(|_| "demo".to_string())
}

/// Get the session password from environment, empty when unset
pub fn main_password() -> String {
    env::var(MAIN_PASSWORD).unwrap_or_default()
}

/// Get the connection descriptor from environment or use default
pub fn connect_string() -> String {
    env::var(CONNECT_STRING).unwrap_or_else(|_| "rowid_demo.db".to_string())
}

/// Get the connect timeout in seconds
pub fn connect_timeout_seconds() -> u64 {
    env::var(CONNECT_TIMEOUT_SECONDS)
        .ok()
        .and_then(|s| u64::from_str(&s).ok())
        .unwrap_or(30)
}

/// Connection parameters assembled from the environment
pub fn connect_params() -> ConnectParams {
    ConnectParams::new(main_user(), main_password(), connect_string())
        .with_timeout(connect_timeout_seconds())
}
