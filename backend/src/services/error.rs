//! Error taxonomy for the overview engine.

use crate::db::RepositoryError;
use crate::models::{AnalysisId, AnalysisResource, TemplateError};

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Failure reported by a live computation collaborator.
#[derive(Debug, thiserror::Error)]
#[error("Query for template {template} failed: {message}")]
pub struct QueryError {
    pub template: String,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl QueryError {
    pub fn new(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Snapshot serialization failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to encode {template} overview: {source}")]
    Encode {
        template: String,
        #[source]
        source: serde_json::Error,
    },

    /// The encoded blob would not decode back, e.g. a non-finite number
    /// written as `null`.
    #[error("Encoded {template} overview does not decode back: {source}")]
    Unreadable {
        template: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode snapshot as {resource}/{template}: {source}")]
    Decode {
        resource: AnalysisResource,
        template: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot checksum mismatch for analysis {analysis_id}")]
    ChecksumMismatch { analysis_id: AnalysisId },
}

/// Export projection and workbook writing failures.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Grouped details cannot be projected to a single grid")]
    GroupedDetails,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Service-level error.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis {0} not found")]
    NotFound(AnalysisId),

    #[error(transparent)]
    InvalidTemplatePairing(#[from] TemplateError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Engine settings could not be read or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AnalysisError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalysisError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        AnalysisError::Configuration(message.into())
    }
}

impl From<RepositoryError> for AnalysisError {
    fn from(err: RepositoryError) -> Self {
        // Surface missing analysis rows as the service-level NotFound.
        if let RepositoryError::NotFound { ref context, .. } = err {
            if context.entity.as_deref() == Some("analysis") {
                if let Some(id) = context.entity_id.as_deref().and_then(|s| s.parse().ok()) {
                    return AnalysisError::NotFound(id);
                }
            }
        }
        AnalysisError::Repository(err)
    }
}
