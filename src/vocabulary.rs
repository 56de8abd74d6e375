//! Domain entity vocabulary.
//!
//! Loaded once at startup from a category-keyed JSON file
//! (`{"organization": ["Acme Corp", ...], ...}`) and immutable thereafter.
//! Lookup keys are case-folded; canonical forms keep their original casing.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    categories: BTreeMap<String, Vec<String>>,
    /// case-folded entity -> canonical entity
    entities: BTreeMap<String, String>,
    max_key_words: usize,
}

impl Vocabulary {
    /// Load the vocabulary from a JSON file mapping category name to a list
    /// of entity names.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let categories: BTreeMap<String, Vec<String>> = serde_json::from_str(&text)?;
        Ok(Self::from_categories(categories))
    }

    pub fn from_categories(categories: BTreeMap<String, Vec<String>>) -> Self {
        let mut entities = BTreeMap::new();
        let mut max_key_words = 1;
        for values in categories.values() {
            for value in values {
                let folded = value.to_lowercase();
                max_key_words = max_key_words.max(folded.split_whitespace().count());
                entities.insert(folded, value.clone());
            }
        }
        Self {
            categories,
            entities,
            max_key_words,
        }
    }

    /// Canonical form for a case-folded key, if the key is known.
    pub fn canonical(&self, folded: &str) -> Option<&str> {
        self.entities.get(folded).map(String::as_str)
    }

    /// All case-folded lookup keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Category owning the given phrase (case-insensitive). The first
    /// matching category wins; curating category lists to avoid ambiguous
    /// overlap is the caller's responsibility.
    pub fn category_of(&self, phrase: &str) -> Option<&str> {
        let folded = phrase.to_lowercase();
        for (name, values) in &self.categories {
            if values.iter().any(|v| v.to_lowercase() == folded) {
                return Some(name);
            }
        }
        None
    }

    pub fn categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.categories
    }

    /// Word count of the longest entity, used to bound matching windows.
    pub fn max_key_words(&self) -> usize {
        self.max_key_words
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
