use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}\p{M}]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "had", "has",
            "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "me", "my",
            "no", "nor", "not", "of", "on", "or", "our", "she", "so", "that", "the", "their",
            "them", "then", "there", "these", "they", "this", "to", "was", "we", "were", "what",
            "when", "where", "which", "who", "will", "with", "you", "your",
        ];
        words.iter().copied().collect()
    };
}

/// Split text into lowercase tokens. A token is a maximal run of Unicode
/// letters, numbers, and combining marks; everything else separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Token pipeline applied identically at ingest and query time: tokenize,
/// optionally preceded by NFKC normalization and followed by stop-word
/// removal and Snowball stemming.
pub struct Analyzer {
    normalize: bool,
    strip_stopwords: bool,
    stemmer: Option<Stemmer>,
}

impl Analyzer {
    /// Bare tokenization. Every indexed term is a literal token of the text.
    pub fn plain() -> Self {
        Self {
            normalize: false,
            strip_stopwords: false,
            stemmer: None,
        }
    }

    /// NFKC normalization, English stop-word removal, and English Snowball
    /// stemming on top of tokenization.
    pub fn english() -> Self {
        Self {
            normalize: true,
            strip_stopwords: true,
            stemmer: Some(Stemmer::create(Algorithm::English)),
        }
    }

    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens = if self.normalize {
            tokenize(&text.nfkc().collect::<String>())
        } else {
            tokenize(text)
        };
        tokens
            .into_iter()
            .filter(|token| !self.strip_stopwords || !STOPWORDS.contains(token.as_str()))
            .map(|token| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&token).to_string(),
                None => token,
            })
            .collect()
    }
}
