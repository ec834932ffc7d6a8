//! Selection of coreference clusters among a model's span groups.

use crate::domain::{Analysis, Cluster};

/// Key prefix spaCy uses for full-span coreference groups (`coref_clusters_1`, ...).
///
/// Head-only groups (`coref_head_clusters_1`, ...) are not selected: their
/// single-token mentions overlap the full spans and would stage conflicting
/// replacements.
pub const DEFAULT_GROUP_PREFIX: &str = "coref_clusters";

/// Span groups whose key starts with `prefix`, in map iteration order.
///
/// Groups with any other key (entity spans, head spans, ...) are ignored.
pub fn coref_clusters<'a>(analysis: &'a Analysis, prefix: &str) -> Vec<Cluster<'a>> {
    analysis
        .spans
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, mentions)| Cluster {
            key: key.as_str(),
            mentions: mentions.as_slice(),
        })
        .collect()
}
