//! Error types for dialect resolution

use thiserror::Error;

/// Dialect resolution errors
#[derive(Debug, Error)]
pub enum DialectError {
    /// Requested dialect is not in the loaded catalog
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// A declared parent dialect is absent from the catalog
    #[error("Dialect '{dialect}' inherits from missing parent '{parent}'")]
    MissingParent {
        /// Dialect declaring the parent
        dialect: String,
        /// Parent identifier that could not be found
        parent: String,
    },

    /// Resolution revisited a dialect already on the active path
    #[error("Cyclic inheritance: {}", cycle.join(" -> "))]
    CyclicInheritance {
        /// Dialects on the cycle, first entry repeated at the end
        cycle: Vec<String>,
    },

    /// Dialect identifier appears twice in one catalog
    #[error("Duplicate dialect: {0}")]
    DuplicateDialect(String),

    /// Definition violates a catalog invariant
    #[error("Invalid dialect definition: {0}")]
    InvalidDefinition(String),

    /// No catalog has been installed yet
    #[error("Resolving service not ready: no catalog loaded")]
    NotReady,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for dialect operations
pub type Result<T> = std::result::Result<T, DialectError>;
