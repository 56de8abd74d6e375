//! Entity tagger.
//!
//! Annotates corrected input inline with the vocabulary category of each
//! recognized entity, producing the tagged representation embedded in the
//! table-selection prompt. Matching is exact (case-insensitive) against the
//! category value lists, widest window first so multi-word entities tag as
//! one token.

use crate::vocabulary::Vocabulary;

/// A token with the category it resolved to, if any. "No category" is
/// explicitly distinct from a match in an uncategorized list: `category` is
/// `None` only when no category list contains the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub category: Option<String>,
}

impl TaggedToken {
    /// Render as `token(category)`, or the bare token when untagged.
    pub fn render(&self) -> String {
        match &self.category {
            Some(category) => format!("{}({})", self.text, category),
            None => self.text.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct EntityTagger;

impl EntityTagger {
    /// Tag each recognized token (window) with its owning category.
    pub fn tag_tokens(&self, vocabulary: &Vocabulary, text: &str) -> Vec<TaggedToken> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let max_window = vocabulary.max_key_words().max(1);
        let mut tagged: Vec<TaggedToken> = Vec::with_capacity(tokens.len());

        let mut i = 0;
        while i < tokens.len() {
            let upper = max_window.min(tokens.len() - i);
            let mut matched = false;
            for window in (1..=upper).rev() {
                let phrase = tokens[i..i + window].join(" ");
                if let Some(category) = vocabulary.category_of(&phrase) {
                    tagged.push(TaggedToken {
                        text: phrase,
                        category: Some(category.to_string()),
                    });
                    i += window;
                    matched = true;
                    break;
                }
            }
            if !matched {
                tagged.push(TaggedToken {
                    text: tokens[i].to_string(),
                    category: None,
                });
                i += 1;
            }
        }

        tagged
    }

    /// Render the tagged form as a single string, e.g.
    /// `show me commits for acme corp(organization)`.
    pub fn tag(&self, vocabulary: &Vocabulary, text: &str) -> String {
        self.tag_tokens(vocabulary, text)
            .iter()
            .map(TaggedToken::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
