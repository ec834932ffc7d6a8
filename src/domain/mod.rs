//! Domain types for coreference substitution.
//!
//! This module contains the data structures exchanged with the external
//! coreference model:
//! - Token / Mention: spans of the document token stream
//! - Analysis: full model output for one document
//! - Cluster: borrowed view over one coreference span group

pub mod analysis;
pub mod token;

// Re-export commonly used types
pub use analysis::{Analysis, Cluster};
pub use token::{surface_text, Mention, Token};
