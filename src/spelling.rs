//! Fuzzy spelling correction against the vocabulary index.
//!
//! Correction is best-effort: tokens with no confident match pass through
//! verbatim, and a fully unmatched input is not an error. Matching slides
//! over token windows up to the longest vocabulary entry so that multi-word
//! entities are corrected as a unit; with single-word entities this is plain
//! per-token matching.

use crate::vocabulary::Vocabulary;
use strsim::jaro_winkler;

/// Similarity threshold for accepting a match (85%).
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

pub struct SpellingCorrector {
    threshold: f64,
}

impl Default for SpellingCorrector {
    fn default() -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
        }
    }
}

impl SpellingCorrector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Rewrite each confidently matched token (window) to its canonical
    /// vocabulary form and return the space-joined result.
    pub fn correct(&self, vocabulary: &Vocabulary, input: &str) -> String {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let max_window = vocabulary.max_key_words().max(1);
        let mut corrected: Vec<String> = Vec::with_capacity(tokens.len());

        let mut i = 0;
        while i < tokens.len() {
            let upper = max_window.min(tokens.len() - i);
            // Best score across all window sizes; ties go to the wider window
            // so an exact multi-word entity is consumed whole.
            let mut best: Option<(usize, String, f64)> = None;
            for window in 1..=upper {
                let folded = tokens[i..i + window].join(" ").to_lowercase();
                if let Some((canonical, score)) = best_match(vocabulary, &folded) {
                    let better = match &best {
                        None => true,
                        Some((w, _, s)) => score > *s || (score == *s && window > *w),
                    };
                    if better {
                        best = Some((window, canonical.to_string(), score));
                    }
                }
            }

            match best {
                Some((window, canonical, score)) if score >= self.threshold => {
                    corrected.push(canonical);
                    i += window;
                }
                _ => {
                    corrected.push(tokens[i].to_string());
                    i += 1;
                }
            }
        }

        corrected.join(" ")
    }
}

/// Highest-scoring vocabulary key for a case-folded candidate.
fn best_match<'a>(vocabulary: &'a Vocabulary, folded: &str) -> Option<(&'a str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for key in vocabulary.keys() {
        let score = jaro_winkler(folded, key);
        if best.map_or(true, |(_, s)| score > s) {
            if let Some(canonical) = vocabulary.canonical(key) {
                best = Some((canonical, score));
            }
        }
    }
    best
}
