use crate::postings::PostingSet;
use crate::trie::PatriciaTrie;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub type DocId = u32;

/// Keeps cosine scores finite when either norm is zero.
const NORM_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Exact,
    Prefix,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOperator {
    And,
    #[default]
    Or,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub operator: QueryOperator,
    /// Maximum edit distance; only meaningful for [`SearchMode::Fuzzy`].
    pub distance: u32,
}

/// Candidate documents for a query along with the index-side tokens that
/// produced them. Prefix and fuzzy lookups contribute one token per matched
/// term, which is what weights the query vector during ranking.
#[derive(Debug, Clone, Default)]
pub struct IndexResult {
    pub postings: PostingSet,
    pub tokens: Vec<String>,
}

impl IndexResult {
    pub fn new(postings: PostingSet, tokens: Vec<String>) -> Self {
        Self { postings, tokens }
    }

    pub fn combine_or(&mut self, other: IndexResult) {
        self.postings.union_in_place(&other.postings);
        self.tokens.extend(other.tokens);
    }

    pub fn combine_and(&mut self, other: IndexResult) {
        self.postings.intersect_in_place(&other.postings);
        self.tokens.extend(other.tokens);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankResult {
    pub id: DocId,
    pub score: f64,
}

/// Per-document vector materialized at build time: token -> tf(token) *
/// idf(token), plus the vector's squared norm.
#[derive(Debug)]
struct DocEntry {
    tf_idf: HashMap<String, f64>,
    norm: f64,
}

/// Accumulates postings and per-document term frequencies during ingestion.
/// Documents must be added in id order starting from 0; `build` consumes the
/// builder, so an index can only be searched once ingestion is finished.
#[derive(Default)]
pub struct IndexBuilder {
    trie: PatriciaTrie,
    term_freqs: Vec<HashMap<String, f64>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            trie: PatriciaTrie::new(),
            term_freqs: Vec::new(),
        }
    }

    pub fn add(&mut self, tokens: &[String], id: DocId) {
        debug_assert_eq!(
            id as usize,
            self.term_freqs.len(),
            "documents must be added in id order"
        );
        for token in tokens {
            self.trie.get_or_insert(token).add(id);
        }
        self.term_freqs.push(term_frequency(tokens));
    }

    pub fn build(self) -> SearchIndex {
        let doc_count = self.term_freqs.len();

        let mut idf: HashMap<String, f64> = HashMap::new();
        for (token, set) in self.trie.terms() {
            idf.insert(token, (doc_count as f64 / set.cardinality() as f64).ln());
        }

        let entries = self
            .term_freqs
            .into_iter()
            .map(|mut tf| {
                for (token, freq) in tf.iter_mut() {
                    let token_idf = idf
                        .get(token)
                        .expect("indexed token missing an idf entry");
                    *freq *= token_idf;
                }
                // Sum in sorted token order for the same reason `rank` does:
                // map iteration order must not leak into the scores.
                let norm = {
                    let mut weights: Vec<(&String, &f64)> = tf.iter().collect();
                    weights.sort_by(|a, b| a.0.cmp(b.0));
                    weights.into_iter().map(|(_, v)| v * v).sum()
                };
                DocEntry { tf_idf: tf, norm }
            })
            .collect();

        SearchIndex {
            trie: self.trie,
            idf,
            entries,
            default_idf: ((doc_count + 1) as f64).ln(),
        }
    }
}

/// Immutable queryable index: the trie, the IDF table, and the per-document
/// TF-IDF vectors. All read paths are safe under concurrent readers.
pub struct SearchIndex {
    trie: PatriciaTrie,
    idf: HashMap<String, f64>,
    entries: Vec<DocEntry>,
    /// IDF assigned to query tokens absent from the corpus, smoothed to
    /// ln(N + 1) so an unseen token counts as maximally rare.
    default_idf: f64,
}

impl SearchIndex {
    /// Tokenize `query` with the same pipeline used at ingest, look each
    /// token up under the requested mode, and fold the per-token results
    /// with the requested operator. An empty posting set is a valid
    /// "no match" outcome.
    pub fn search<F>(&self, query: &str, options: SearchOptions, tokenizer: F) -> IndexResult
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut combined: Option<IndexResult> = None;
        for token in tokenizer(query) {
            let looked_up = match options.mode {
                SearchMode::Exact => self.trie.search(&token),
                SearchMode::Prefix => self.trie.starts_with(&token),
                SearchMode::Fuzzy => self.trie.fuzzy_search(&token, options.distance),
            };
            match options.operator {
                QueryOperator::Or => {
                    // Tokens with no match contribute nothing to a union.
                    if let Some(result) = looked_up {
                        match combined.as_mut() {
                            Some(acc) => acc.combine_or(result),
                            None => combined = Some(result),
                        }
                    }
                }
                QueryOperator::And => {
                    let result = looked_up.unwrap_or_default();
                    match combined.as_mut() {
                        Some(acc) => acc.combine_and(result),
                        None => combined = Some(result),
                    }
                }
            }
        }
        combined.unwrap_or_default()
    }

    /// Score `doc_ids` by cosine similarity between each document's TF-IDF
    /// vector and the query vector derived from `tokens`, descending. Ties
    /// break by ascending id, so identical inputs always rank identically.
    pub fn rank(&self, tokens: &[String], doc_ids: &[DocId]) -> Vec<RankResult> {
        // Accumulate in sorted token order; float addition is not
        // associative, and hash-map iteration order would leak into the low
        // bits of the scores.
        let mut term_freqs: Vec<(String, f64)> = term_frequency(tokens).into_iter().collect();
        term_freqs.sort_by(|a, b| a.0.cmp(&b.0));

        // The query norm depends on the query alone, never on the candidate.
        let mut query_norm = 0.0;
        for (token, query_tf) in &term_freqs {
            let token_idf = self.idf_or_default(token);
            query_norm += query_tf * query_tf * token_idf * token_idf;
        }

        let mut results: Vec<RankResult> = Vec::with_capacity(doc_ids.len());
        for &id in doc_ids {
            let doc = &self.entries[id as usize];
            let mut dot = 0.0;
            for (token, query_tf) in &term_freqs {
                let doc_weight = doc.tf_idf.get(token).copied().unwrap_or(0.0);
                dot += query_tf * self.idf_or_default(token) * doc_weight;
            }
            let inv_norm = 1.0 / (query_norm * doc.norm + NORM_EPSILON).sqrt();
            results.push(RankResult {
                id,
                score: dot * inv_norm,
            });
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results
    }

    pub fn doc_count(&self) -> usize {
        self.entries.len()
    }

    pub fn term_count(&self) -> usize {
        self.idf.len()
    }

    pub fn idf(&self, token: &str) -> Option<f64> {
        self.idf.get(token).copied()
    }

    /// Every indexed term with its document frequency.
    pub fn term_stats(&self) -> Vec<(String, u64)> {
        self.trie
            .terms()
            .into_iter()
            .map(|(token, set)| (token, set.cardinality()))
            .collect()
    }

    fn idf_or_default(&self, token: &str) -> f64 {
        self.idf.get(token).copied().unwrap_or(self.default_idf)
    }
}

/// Term counts normalized by token count. Empty input yields an empty map.
fn term_frequency(tokens: &[String]) -> HashMap<String, f64> {
    if tokens.is_empty() {
        return HashMap::new();
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    let total = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(token, count)| (token.to_string(), count as f64 / total))
        .collect()
}
