//! Errors raised while resolving coreferences.

use thiserror::Error;

/// Failure of a single resolution call. No partial output accompanies it.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid mention {mention:?}: {reason}")]
    InvalidMention { mention: String, reason: String },

    #[error("Conflicting replacements at offset {offset}: {existing:?} vs {incoming:?}")]
    ConflictingReplacement {
        offset: usize,
        existing: String,
        incoming: String,
    },

    #[error("Token stream does not reproduce the input text (diverges at character {offset})")]
    TokenStreamMismatch { offset: usize },

    #[error("Input too large: {actual} > {limit} bytes")]
    InputTooLarge { actual: usize, limit: usize },

    #[error("Coreference model failed: {0:#}")]
    Model(#[from] anyhow::Error),
}

impl ResolveError {
    pub(crate) fn invalid_mention(mention: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMention {
            mention: mention.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure comes from the input data rather than the model
    /// or the environment
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, Self::Model(_))
    }
}
