//! Resolution entry point.
//!
//! Runs the injected model, checks its output against the document, filters
//! coreference clusters and applies the substitution engine.

use tracing::{debug, instrument};

use crate::adapters::CorefModel;
use crate::domain::Analysis;

use super::error::ResolveError;
use super::filter::{coref_clusters, DEFAULT_GROUP_PREFIX};
use super::substitution::substitute;

/// Resolver settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Span group key prefix marking coreference clusters
    pub group_prefix: String,
    /// Maximum document size handed to the model
    pub max_input_bytes: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            max_input_bytes: 1_048_576, // 1MB
        }
    }
}

/// Resolves coreferences of an entity using an injected model
pub struct Resolver<M> {
    model: M,
    settings: ResolverSettings,
}

impl<M: CorefModel> Resolver<M> {
    /// Create a resolver with default settings
    pub fn new(model: M) -> Self {
        Self::with_settings(model, ResolverSettings::default())
    }

    pub fn with_settings(model: M, settings: ResolverSettings) -> Self {
        Self { model, settings }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Run the model on `text` and check that its tokens reproduce the text.
    ///
    /// Blank text is tokenized locally without calling the model.
    #[instrument(skip(self, text), fields(model = %self.model.name(), bytes = text.len()))]
    pub async fn analyze(&self, text: &str) -> Result<Analysis, ResolveError> {
        if text.len() > self.settings.max_input_bytes {
            return Err(ResolveError::InputTooLarge {
                actual: text.len(),
                limit: self.settings.max_input_bytes,
            });
        }

        if text.trim().is_empty() {
            return Ok(Analysis::tokenized(text));
        }

        let analysis = self.model.analyze(text).await?;

        if let Some(offset) = analysis.divergence(text) {
            return Err(ResolveError::TokenStreamMismatch { offset });
        }

        debug!(
            tokens = analysis.tokens.len(),
            groups = analysis.spans.len(),
            "Analysis accepted"
        );
        Ok(analysis)
    }

    /// Rewrite an already analyzed document for `entity`
    pub fn resolve_with(&self, entity: &str, analysis: &Analysis) -> Result<String, ResolveError> {
        let clusters = coref_clusters(analysis, &self.settings.group_prefix);
        substitute(entity, &analysis.tokens, &clusters)
    }

    /// Resolve all coreferences of `entity` in `text`
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn resolve_coref(&self, entity: &str, text: &str) -> Result<String, ResolveError> {
        let analysis = self.analyze(text).await?;
        self.resolve_with(entity, &analysis)
    }
}
