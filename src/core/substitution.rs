//! Offset-keyed substitution of entity mentions.
//!
//! Replacements are staged in a [`ReplacementMap`] keyed by token start
//! offset, then the output is built in one pass over the token stream. The
//! source text is never edited in place, so no offset ever shifts.
//!
//! For every cluster containing a mention spelled exactly like the entity,
//! every other mention collapses to a single replacement:
//! - its first token becomes `entity + first_token.trailing_whitespace`
//! - its remaining tokens are dropped together with their whitespace

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::domain::{surface_text, Cluster, Mention, Token};

use super::error::ResolveError;

/// Staged replacements keyed by token start offset
#[derive(Debug, Default)]
pub struct ReplacementMap {
    rules: HashMap<usize, String>,
}

impl ReplacementMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a replacement for the token starting at `offset`.
    ///
    /// Staging the same value twice is a no-op. Staging a different value for
    /// an offset that already has one fails, so the result never depends on
    /// the order clusters were visited in.
    pub fn insert(&mut self, offset: usize, replacement: String) -> Result<(), ResolveError> {
        match self.rules.entry(offset) {
            Entry::Vacant(slot) => {
                slot.insert(replacement);
                Ok(())
            }
            Entry::Occupied(slot) if *slot.get() == replacement => Ok(()),
            Entry::Occupied(slot) => Err(ResolveError::ConflictingReplacement {
                offset,
                existing: slot.get().clone(),
                incoming: replacement,
            }),
        }
    }

    /// Stage the collapse of `mention` into `entity`
    pub fn add_mention(&mut self, entity: &str, mention: &Mention) -> Result<(), ResolveError> {
        let first = mention
            .first_token()
            .ok_or_else(|| ResolveError::invalid_mention(&mention.text, "mention has no tokens"))?;

        trace!(mention = %mention.text, offset = first.start_offset, "Staging replacement");
        self.insert(
            first.start_offset,
            format!("{}{}", entity, first.trailing_whitespace),
        )?;

        for token in mention.trailing_tokens() {
            self.insert(token.start_offset, String::new())?;
        }

        Ok(())
    }

    /// Replacement staged for `offset`, if any
    pub fn get(&self, offset: usize) -> Option<&str> {
        self.rules.get(&offset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Build the output by walking the token stream once, consuming the map
    pub fn render(self, tokens: &[Token]) -> String {
        let mut output = String::with_capacity(
            tokens
                .iter()
                .map(|t| t.text.len() + t.trailing_whitespace.len())
                .sum(),
        );

        for token in tokens {
            match self.rules.get(&token.start_offset) {
                Some(replacement) => output.push_str(replacement),
                None => {
                    output.push_str(&token.text);
                    output.push_str(&token.trailing_whitespace);
                }
            }
        }

        output
    }
}

/// Check every mention of every cluster against the document token stream.
///
/// A mention must be non-empty, its offsets strictly increasing, each of its
/// tokens must appear in `tokens` with the same text, the tokens must be
/// adjacent in the stream, and its text must equal the text they span.
pub fn validate_mentions(tokens: &[Token], clusters: &[Cluster<'_>]) -> Result<(), ResolveError> {
    let mut positions: HashMap<usize, usize> = HashMap::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        if positions.insert(token.start_offset, index).is_some() {
            return Err(ResolveError::TokenStreamMismatch {
                offset: token.start_offset,
            });
        }
    }

    for cluster in clusters {
        for mention in cluster.mentions {
            validate_mention(mention, tokens, &positions)?;
        }
    }

    Ok(())
}

fn validate_mention(
    mention: &Mention,
    tokens: &[Token],
    positions: &HashMap<usize, usize>,
) -> Result<(), ResolveError> {
    if mention.tokens.is_empty() {
        return Err(ResolveError::invalid_mention(&mention.text, "mention has no tokens"));
    }

    let mut previous: Option<(usize, usize)> = None;
    for token in &mention.tokens {
        let position = *positions.get(&token.start_offset).ok_or_else(|| {
            ResolveError::invalid_mention(
                &mention.text,
                format!("no document token starts at offset {}", token.start_offset),
            )
        })?;

        if tokens[position].text != token.text {
            return Err(ResolveError::invalid_mention(
                &mention.text,
                format!(
                    "token {:?} at offset {} does not match document token {:?}",
                    token.text, token.start_offset, tokens[position].text
                ),
            ));
        }

        if let Some((prev_offset, prev_position)) = previous {
            if token.start_offset <= prev_offset {
                return Err(ResolveError::invalid_mention(
                    &mention.text,
                    "token offsets are not strictly increasing",
                ));
            }
            if position != prev_position + 1 {
                return Err(ResolveError::invalid_mention(
                    &mention.text,
                    "tokens are not contiguous in the document",
                ));
            }
        }
        previous = Some((token.start_offset, position));
    }

    if surface_text(&mention.tokens) != mention.text {
        return Err(ResolveError::invalid_mention(
            &mention.text,
            "mention text does not match its tokens",
        ));
    }

    Ok(())
}

/// Stage replacements for every cluster containing `entity`
pub fn build_replacements(
    entity: &str,
    clusters: &[Cluster<'_>],
) -> Result<ReplacementMap, ResolveError> {
    let mut map = ReplacementMap::new();
    let mut retained = 0usize;

    for cluster in clusters.iter().filter(|c| c.contains_entity(entity)) {
        retained += 1;
        for mention in cluster.other_mentions(entity) {
            map.add_mention(entity, mention)?;
        }
    }

    debug!(
        clusters = clusters.len(),
        retained,
        rules = map.len(),
        "Built replacement map"
    );
    Ok(map)
}

/// Rewrite the document so every coreferent mention of `entity` reads as
/// `entity`.
///
/// Returns the document unchanged (as reconstructed from `tokens`) when no
/// cluster contains a mention spelled exactly like `entity`.
pub fn substitute(
    entity: &str,
    tokens: &[Token],
    clusters: &[Cluster<'_>],
) -> Result<String, ResolveError> {
    validate_mentions(tokens, clusters)?;
    let map = build_replacements(entity, clusters)?;
    Ok(map.render(tokens))
}
