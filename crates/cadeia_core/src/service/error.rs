//! Errors shared by chain use-case services.

use crate::model::document::DocumentId;
use crate::model::property::PropertyId;
use crate::repo::chain_repo::ChainRepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from chain service operations.
///
/// Data-quality problems (missing principal, unresolved or cyclic origins)
/// are reported inside result payloads, not through this type.
#[derive(Debug)]
pub enum ChainServiceError {
    /// Requested property does not exist.
    PropertyNotFound(PropertyId),
    /// Requested document does not exist.
    DocumentNotFound(DocumentId),
    /// Repository-level failure.
    Repo(ChainRepoError),
}

impl Display for ChainServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PropertyNotFound(id) => write!(f, "property not found: {id}"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ChainServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ChainRepoError> for ChainServiceError {
    fn from(value: ChainRepoError) -> Self {
        match value {
            ChainRepoError::PropertyNotFound(id) => Self::PropertyNotFound(id),
            ChainRepoError::DocumentNotFound(id) => Self::DocumentNotFound(id),
            other => Self::Repo(other),
        }
    }
}
