use std::path::PathBuf;
use thiserror::Error;

/// Startup failures. Any of these leaves the process unable to serve queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Catalog {path} must contain a '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Catalog {path} did not contain any usable records")]
    Empty { path: PathBuf },
}

/// Recoverable query failures, surfaced to the user rather than aborting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Title not found: '{title}'")]
    TitleNotFound {
        title: String,
        suggestions: Vec<String>,
    },
}

impl QueryError {
    pub fn suggestions(&self) -> &[String] {
        match self {
            QueryError::TitleNotFound { suggestions, .. } => suggestions,
        }
    }
}
