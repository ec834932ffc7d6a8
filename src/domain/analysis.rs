//! Model output for a single document.
//!
//! An [`Analysis`] is the JSON document exchanged with coreference model
//! processes and stored in analysis files:
//!
//! ```json
//! {
//!   "tokens": [{"text": "Alice", "start_offset": 0, "trailing_whitespace": " "}],
//!   "spans": {
//!     "coref_clusters_1": [
//!       {"text": "Alice", "tokens": [{"text": "Alice", "start_offset": 0, "trailing_whitespace": " "}]}
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::token::{Mention, Token};

/// Full token stream plus span groups for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Every token of the document, in document order
    #[serde(default)]
    pub tokens: Vec<Token>,

    /// Span groups keyed by group name (coreference clusters and others)
    #[serde(default)]
    pub spans: BTreeMap<String, Vec<Mention>>,
}

/// A borrowed view over one coreference span group
#[derive(Debug, Clone, Copy)]
pub struct Cluster<'a> {
    pub key: &'a str,
    pub mentions: &'a [Mention],
}

impl<'a> Cluster<'a> {
    /// Whether any mention is spelled exactly like the entity
    pub fn contains_entity(&self, entity: &str) -> bool {
        self.mentions.iter().any(|m| m.is_entity(entity))
    }

    /// Mentions that are not spelled like the entity
    pub fn other_mentions<'e>(&self, entity: &'e str) -> impl Iterator<Item = &'a Mention> + 'e
    where
        'a: 'e,
    {
        self.mentions.iter().filter(move |m| !m.is_entity(entity))
    }
}

impl Analysis {
    /// Tokenize text without any span groups.
    ///
    /// Words are maximal runs of alphanumeric characters; every other
    /// non-whitespace character is a token of its own. Whitespace attaches to
    /// the preceding token, and leading whitespace becomes a token so the
    /// stream still covers the whole text.
    pub fn tokenized(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let collect = |range: Range<usize>| chars[range].iter().collect::<String>();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i > 0 {
            tokens.push(Token::new(collect(0..i), 0, ""));
        }

        while i < chars.len() {
            let start = i;
            if is_word_char(chars[i]) {
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
            } else {
                i += 1;
            }
            let ws_start = i;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            tokens.push(Token::new(collect(start..ws_start), start, collect(ws_start..i)));
        }

        Self {
            tokens,
            spans: BTreeMap::new(),
        }
    }

    /// Add a span group whose mentions are given as token index ranges.
    /// Fixture builder for tests and test doubles.
    ///
    /// # Panics
    ///
    /// Panics if a range falls outside the token stream.
    #[doc(hidden)]
    pub fn with_group(mut self, key: impl Into<String>, ranges: &[Range<usize>]) -> Self {
        let mentions = ranges
            .iter()
            .map(|range| Mention::from_tokens(self.tokens[range.clone()].to_vec()))
            .collect();
        self.spans.insert(key.into(), mentions);
        self
    }

    /// Concatenate every token with its trailing whitespace
    pub fn reconstruct(&self) -> String {
        self.tokens.iter().map(Token::text_with_ws).collect()
    }

    /// First character position where the token stream stops reproducing
    /// `text`, or `None` when the tokens tile it exactly.
    pub fn divergence(&self, text: &str) -> Option<usize> {
        let mut chars = text.chars();
        let mut pos = 0usize;

        for token in &self.tokens {
            if token.start_offset != pos {
                return Some(pos);
            }
            for expected in token.text.chars().chain(token.trailing_whitespace.chars()) {
                match chars.next() {
                    Some(c) if c == expected => pos += 1,
                    _ => return Some(pos),
                }
            }
        }

        chars.next().map(|_| pos)
    }

    /// Total number of mentions across all span groups
    pub fn mention_count(&self) -> usize {
        self.spans.values().map(Vec::len).sum()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
