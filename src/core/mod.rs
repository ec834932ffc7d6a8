//! Core coreference substitution logic.
//!
//! This module contains:
//! - Filter: selection of coreference span groups
//! - Substitution: the offset-keyed replacement engine
//! - Resolver: entry point wiring a model to the engine

pub mod error;
pub mod filter;
pub mod resolver;
pub mod substitution;

// Re-export commonly used types
pub use error::ResolveError;
pub use filter::{coref_clusters, DEFAULT_GROUP_PREFIX};
pub use resolver::{Resolver, ResolverSettings};
pub use substitution::{build_replacements, substitute, validate_mentions, ReplacementMap};
