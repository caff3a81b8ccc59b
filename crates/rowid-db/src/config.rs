//! Connection parameters for rowid-db
//!
//! Carries the credentials and connection descriptor a session is opened
//! with. Only embedded (local file or in-memory) databases are accepted.

use crate::error::{DatabaseError, Result};
use std::fmt;

/// Descriptor prefixes that point at a remote server
const REMOTE_PREFIXES: [&str; 4] = ["libsql://", "http://", "https://", "wss://"];

/// Parameters for opening a database session
#[derive(Clone)]
pub struct ConnectParams {
    /// Session user name
    pub user: String,
    /// Session password. The embedded engine does not authenticate, so it is
    /// carried but never sent anywhere.
    pub password: String,
    /// Database path, or `:memory:`
    pub dsn: String,
    /// Connection timeout in seconds
    pub timeout_secs: u64,
}

impl ConnectParams {
    /// Create connection parameters with default settings
    pub fn new<U, P, D>(user: U, password: P, dsn: D) -> Self
    where
        U: Into<String>,
        P: Into<String>,
        D: Into<String>,
    {
        Self {
            user: user.into(),
            password: password.into(),
            dsn: dsn.into(),
            timeout_secs: 30,
        }
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Check if this is an in-memory database
    pub fn is_memory(&self) -> bool {
        self.dsn == ":memory:" || self.dsn.contains("mode=memory")
    }

    /// Check if the descriptor names a remote server
    pub fn is_remote(&self) -> bool {
        REMOTE_PREFIXES
            .iter()
            .any(|prefix| self.dsn.starts_with(prefix))
    }

    /// Get database type description
    pub fn database_type(&self) -> &'static str {
        if self.is_memory() {
            "in-memory SQLite"
        } else if self.is_remote() {
            "remote SQLite"
        } else {
            "local SQLite"
        }
    }

    /// Reject parameters a session cannot be opened with
    pub fn validate(&self) -> Result<()> {
        if self.dsn.trim().is_empty() {
            return Err(DatabaseError::configuration(
                "connection descriptor is empty",
            ));
        }
        if self.user.trim().is_empty() {
            return Err(DatabaseError::configuration("user name is empty"));
        }
        if self.is_remote() {
            return Err(DatabaseError::configuration(format!(
                "remote descriptor '{}' is not supported, use a local path or :memory:",
                self.dsn
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dsn", &self.dsn)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
