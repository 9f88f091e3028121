//! Error types for schema management and data access.

use wink_sql_builder::BuildError;

/// Errors that can occur while managing tables or running statements.
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    /// A column capability does not fit its type, e.g. `auto_increment` on
    /// a non-integer column.
    #[error("Invalid type for column '{0}'")]
    InvalidType(String),

    /// The live table differs from its definition in a way that cannot be
    /// altered safely.
    #[error("Unhandled schema drift on '{table}.{column}': {reason}")]
    UnhandledSchemaDrift {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// What would be lost.
        reason: String,
    },

    /// The statement referenced a table that does not exist.
    #[error("No such table: {0}")]
    NoSuchTable(String),

    /// The server rejected the statement's syntax.
    #[error("SQL syntax error in: {sql}")]
    SqlSyntax {
        /// The rejected statement.
        sql: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was called without the data it needs.
    #[error("No data: {0}")]
    NoData(&'static str),

    /// The executor returned a result of the wrong shape.
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),

    /// A condition could not be built.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
