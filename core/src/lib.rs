pub mod index;
pub mod levenshtein;
pub mod postings;
pub mod tokenizer;
pub mod trie;

pub use index::{
    DocId, IndexBuilder, IndexResult, QueryOperator, RankResult, SearchIndex, SearchMode,
    SearchOptions,
};
pub use levenshtein::levenshtein;
pub use postings::PostingSet;
pub use tokenizer::{tokenize, Analyzer};
pub use trie::PatriciaTrie;
