//! coresolve - Entity-targeted coreference substitution
//!
//! Rewrites a document so that every mention co-referring with a target
//! entity reads as the entity itself. Clustering is delegated to an external
//! coreference model; this crate owns the substitution.
//!
//! # Architecture
//!
//! The substitution never edits the text in place:
//! - The model returns the document token stream plus mention clusters
//! - Replacements are staged in a map keyed by token start offset
//! - The output is built in one pass over the token stream
//!
//! # Modules
//!
//! - `adapters`: External coreference models (subprocess, precomputed)
//! - `core`: Substitution engine, cluster filter, resolver
//! - `domain`: Data structures (Token, Mention, Analysis)
//! - `collate`: Annotation table and raw document collation
//! - `batch`: Table-wide resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Resolve an entity in a document
//! echo "Alice went home. She was tired." | coresolve resolve Alice
//!
//! # Collate a dataset, then resolve every annotated mention
//! coresolve collate data/semeval_train -l EN
//! coresolve batch data/semeval_train/subtask1_EN_clean.csv
//! ```

pub mod adapters;
pub mod batch;
pub mod cli;
pub mod collate;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{CorefModel, PrecomputedModel, SubprocessModel};
pub use core::{ResolveError, Resolver, ResolverSettings};
pub use domain::{Analysis, Cluster, Mention, Token};
