use thiserror::Error;

use crate::models::RatingSource;

/// Reasons a title lookup can fail.
///
/// Optional sources never produce one of these; their failures are absorbed
/// by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// An authoritative source confirmed the title does not exist
    #[error("{0}")]
    NotFound(String),

    /// A mandatory source is missing required configuration
    #[error("{0}")]
    UpstreamConfig(String),

    /// A mandatory source could not be reached or answered garbage
    #[error("{provider} unavailable: {message}")]
    UpstreamUnavailable {
        provider: RatingSource,
        message: String,
    },
}

impl AggregateError {
    pub fn not_found_on(title: &str, source: RatingSource) -> Self {
        AggregateError::NotFound(format!("Movie '{}' not found on {}", title, source))
    }

    /// Short tag for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            AggregateError::NotFound(_) => "not_found",
            AggregateError::UpstreamConfig(_) => "upstream_config",
            AggregateError::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregateError>;
