//! Error types for asset resolution.

use thiserror::Error;

/// A transport-level failure reported by a collaborator (network, decoding,
/// storage backend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(msg: impl Into<String>) -> Self {
        TransportError(msg.into())
    }
}

/// Failure to turn an object-store key into a download URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The key does not exist (yet).
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("lookup failed: {0}")]
    Transport(#[from] TransportError),
}

/// Failure reported by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GenerateError(pub String);

/// Errors surfaced by [`crate::AssetResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AssetError {
    /// Reading or decoding the region map or vector art failed.
    #[error("failed to fetch {what}: {reason}")]
    FetchFailed { what: String, reason: String },

    /// The generation service itself failed.
    #[error("generation failed for {object}: {reason}")]
    GenerationFailed { object: String, reason: String },

    /// The generator reported success but the cache still misses.
    #[error("generator reported success but {key} is still missing")]
    GenerationInconsistent { key: String },
}

impl AssetError {
    pub(crate) fn fetch(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns a user-friendly message suitable for display.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::FetchFailed { .. } => {
                "Could not load this picture. Check your connection and try again."
            }
            Self::GenerationFailed { .. } => {
                "Could not turn this photo into a picture. Try again later or use a smaller image."
            }
            Self::GenerationInconsistent { .. } => {
                "The picture could not be prepared. Please upload the photo again."
            }
        }
    }

    /// Whether re-running the whole resolution may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::GenerationFailed { .. }
        )
    }
}
