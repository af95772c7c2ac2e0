//! Error taxonomy for catalog loading.
//!
//! Single-entity operations (`load_index`, `load_brand`) surface these
//! directly. Multi-entity operations log per-brand failures and carry on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// JSON parsed but did not match the expected shape.
    #[error("{what} failed validation:\n{details}")]
    Validation { what: String, details: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Fetch failed or returned a non-success status.
    #[error("failed to fetch {path}: {message}")]
    Network { path: String, message: String },

    /// Body was fetched but is not JSON.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn validation(what: impl Into<String>, details: impl Into<String>) -> Self {
        CatalogError::Validation {
            what: what.into(),
            details: details.into(),
        }
    }

    pub fn network(path: impl Into<String>, message: impl ToString) -> Self {
        CatalogError::Network {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        CatalogError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// True for both schema violations and malformed JSON.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::Validation { .. } | CatalogError::Parse { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, CatalogError::Network { .. })
    }
}
