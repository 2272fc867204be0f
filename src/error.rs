use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading catalogs, validating inputs and running enrichment.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The catalog file could not be read or did not contain a name -> gene-set mapping.
    #[error("failed to load pathway catalog from {path}: {reason}")]
    CatalogLoad { path: PathBuf, reason: String },

    /// The built-in catalog identifier is not recognized.
    #[error("unknown built-in catalog '{0}' (expected one of: cell_markers, hallmark)")]
    UnknownCatalog(String),

    /// Nothing testable for a cluster: empty ranks or every pathway filtered by size.
    #[error("degenerate enrichment input: {0}")]
    DegenerateInput(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Duplicate gene identifiers or non-finite scores in a ranked gene list.
    #[error("invalid ranked gene list: {0}")]
    InvalidRanks(String),

    #[error(transparent)]
    Statistics(#[from] anyhow::Error),
}

impl AnnotationError {
    pub(crate) fn catalog_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AnnotationError::CatalogLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only affects a single cluster and should be recovered as "unidentified".
    pub fn is_degenerate(&self) -> bool {
        matches!(self, AnnotationError::DegenerateInput(_))
    }
}

pub type Result<T> = std::result::Result<T, AnnotationError>;
