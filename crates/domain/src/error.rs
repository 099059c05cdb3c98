//! Use-case error types.

use store::{CacheError, RepositoryError};
use thiserror::Error;

use crate::order::OrderError;

/// Errors returned by order use cases.
#[derive(Debug, Error)]
pub enum UseCaseError {
    /// A domain rule rejected the operation.
    #[error("Order error: {0}")]
    Domain(#[from] OrderError),

    /// The durable store failed or the order does not exist.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The search index could not be queried.
    #[error("Search error: {0}")]
    Search(#[from] CacheError),
}

impl UseCaseError {
    /// Returns true if the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UseCaseError::Repository(e) if e.is_not_found())
    }
}
