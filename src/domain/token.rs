//! Tokens and mentions as produced by an external coreference model.
//!
//! Offsets are character indices into the source document, matching what
//! spaCy reports as `Token.idx`. Nothing in this crate slices the document by
//! these offsets; they are only used as keys.

use serde::{Deserialize, Serialize};

/// The atomic unit of substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text of the token
    pub text: String,

    /// Character index where the token begins
    #[serde(alias = "idx")]
    pub start_offset: usize,

    /// Separator following the token in the original document (may be empty)
    #[serde(default, alias = "whitespace_", alias = "ws")]
    pub trailing_whitespace: String,
}

impl Token {
    /// Create a new token
    pub fn new(
        text: impl Into<String>,
        start_offset: usize,
        trailing_whitespace: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            start_offset,
            trailing_whitespace: trailing_whitespace.into(),
        }
    }

    /// Token text followed by its trailing whitespace
    pub fn text_with_ws(&self) -> String {
        format!("{}{}", self.text, self.trailing_whitespace)
    }
}

/// A contiguous run of tokens referring to one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Full surface text of the mention
    pub text: String,

    /// Tokens of the mention, first to last
    pub tokens: Vec<Token>,
}

impl Mention {
    /// Build a mention from its tokens, deriving the surface text.
    ///
    /// The text is every token's text joined by the whitespace that followed
    /// it, without the last token's trailing whitespace.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let text = surface_text(&tokens);
        Self { text, tokens }
    }

    /// Whether this mention is spelled exactly like the entity
    pub fn is_entity(&self, entity: &str) -> bool {
        self.text == entity
    }

    /// First token, if any
    pub fn first_token(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// Tokens after the first one
    pub fn trailing_tokens(&self) -> &[Token] {
        self.tokens.get(1..).unwrap_or(&[])
    }
}

/// Surface text spanned by a run of tokens
pub fn surface_text(tokens: &[Token]) -> String {
    let mut text = String::new();
    if let Some((last, init)) = tokens.split_last() {
        for token in init {
            text.push_str(&token.text);
            text.push_str(&token.trailing_whitespace);
        }
        text.push_str(&last.text);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_text_from_tokens() {
        let mention = Mention::from_tokens(vec![
            Token::new("the", 10, " "),
            Token::new("president", 14, " "),
        ]);
        assert_eq!(mention.text, "the president");
        assert!(mention.is_entity("the president"));
        assert!(!mention.is_entity("The president"));
        assert_eq!(mention.trailing_tokens().len(), 1);
    }

    #[test]
    fn test_empty_mention_has_no_tokens() {
        let mention = Mention::from_tokens(Vec::new());
        assert_eq!(mention.text, "");
        assert!(mention.first_token().is_none());
        assert!(mention.trailing_tokens().is_empty());
    }

    #[test]
    fn test_token_accepts_spacy_field_names() {
        let json = r#"{"text": "She", "idx": 17, "whitespace_": " "}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token, Token::new("She", 17, " "));

        let json = r#"{"text": ".", "start_offset": 30}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.trailing_whitespace, "");
    }
}
