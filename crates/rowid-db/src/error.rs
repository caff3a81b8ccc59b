//! Database error handling module for rowid-db
//!
//! Provides the error type returned by connections and cursors, with the
//! failing statement or descriptor attached as context.

use thiserror::Error;

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Database error types
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Invalid connection parameters
    #[error("Database configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Opening the engine or the session failed
    #[error("Database connection failed: {message}")]
    ConnectionError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Statement preparation, execution or row retrieval failed
    #[error("Query execution failed: {query}")]
    QueryError {
        query: String,
        #[source]
        source: turso::Error,
    },

    /// Beginning, committing or rolling back a transaction failed
    #[error("Transaction error: {message}")]
    TransactionError {
        message: String,
        #[source]
        source: Option<turso::Error>,
    },

    /// Statement shape the cursor refuses to run
    #[error("Unsupported statement: {message}")]
    UnsupportedStatement { message: String },

    /// A named placeholder with no value supplied
    #[error("No value supplied for placeholder '{name}'")]
    UnboundParameter { name: String },

    /// Cursor used after it was closed
    #[error("Cursor is closed")]
    CursorClosed,

    /// Fetch requested without an open result set
    #[error("No result set: the last executed statement was not a query")]
    NoResultSet,

    /// Timeout errors
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Filesystem I/O errors
    #[error("Filesystem error: {path}")]
    FilesystemError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic database errors
    #[error("Database error: {message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DatabaseError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new connection error with source
    pub fn connection_with_source<
        S: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::ConnectionError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(query: S, source: turso::Error) -> Self {
        Self::QueryError {
            query: query.into(),
            source,
        }
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(message: S, source: turso::Error) -> Self {
        Self::TransactionError {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new unsupported statement error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedStatement {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Create a new filesystem error
    pub fn filesystem<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::FilesystemError {
            path: path.into(),
            source,
        }
    }

    /// Create a new generic error with source
    pub fn generic_with_source<
        S: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Generic {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Whether the error came from the caller misusing the cursor rather
    /// than from the engine
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedStatement { .. }
                | Self::UnboundParameter { .. }
                | Self::CursorClosed
                | Self::NoResultSet
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors() {
        assert!(DatabaseError::CursorClosed.is_usage_error());
        assert!(DatabaseError::NoResultSet.is_usage_error());
        assert!(DatabaseError::unsupported("COMMIT").is_usage_error());
        assert!(DatabaseError::UnboundParameter {
            name: ":bvid".to_string()
        }
        .is_usage_error());
        assert!(!DatabaseError::timeout(5).is_usage_error());
        assert!(!DatabaseError::configuration("empty dsn").is_usage_error());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            DatabaseError::timeout(30).to_string(),
            "Operation timed out after 30s"
        );
        assert_eq!(
            DatabaseError::configuration("dsn is empty").to_string(),
            "Database configuration error: dsn is empty"
        );
        assert_eq!(DatabaseError::CursorClosed.to_string(), "Cursor is closed");
        assert_eq!(
            DatabaseError::UnboundParameter {
                name: ":bvid".to_string()
            }
            .to_string(),
            "No value supplied for placeholder ':bvid'"
        );
    }
}
