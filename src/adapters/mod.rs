//! Adapter interfaces for external coreference models.
//!
//! A model takes a document and returns a fully materialized [`Analysis`]:
//! the document token stream plus its span groups. Models are injected into
//! the resolver, never held globally.

pub mod precomputed;
pub mod subprocess;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::Analysis;

// Re-export the model adapters
pub use precomputed::PrecomputedModel;
pub use subprocess::SubprocessModel;

/// Trait for external coreference models
#[async_trait]
pub trait CorefModel: Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Tokenize the text and cluster its mentions
    async fn analyze(&self, text: &str) -> Result<Analysis>;
}

#[async_trait]
impl<M: CorefModel + ?Sized> CorefModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn analyze(&self, text: &str) -> Result<Analysis> {
        (**self).analyze(text).await
    }
}
