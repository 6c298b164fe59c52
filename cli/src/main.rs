use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use searchlite_core::index::{DocId, IndexBuilder, QueryOperator, SearchIndex, SearchMode, SearchOptions};
use searchlite_core::tokenizer::Analyzer;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searchlite")]
#[command(about = "Query a line-oriented corpus from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AnalyzerChoice {
    Plain,
    English,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeChoice {
    Exact,
    Prefix,
    Fuzzy,
}

#[derive(Clone, Copy, ValueEnum)]
enum OpChoice {
    And,
    Or,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an in-memory index from a corpus file and run one query
    Search {
        /// Corpus file, one document per line
        #[arg(long)]
        corpus: String,
        /// Query text
        query: String,
        #[arg(long, value_enum, default_value = "exact")]
        mode: ModeChoice,
        #[arg(long, value_enum, default_value = "or")]
        op: OpChoice,
        /// Maximum edit distance for fuzzy mode
        #[arg(long, default_value_t = 0)]
        distance: u32,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value = "plain")]
        analyzer: AnalyzerChoice,
    },
    /// Print corpus statistics
    Stats {
        /// Corpus file, one document per line
        #[arg(long)]
        corpus: String,
        #[arg(long, value_enum, default_value = "plain")]
        analyzer: AnalyzerChoice,
    },
}

#[derive(Serialize)]
struct Hit<'a> {
    id: DocId,
    score: f64,
    text: &'a str,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            corpus,
            query,
            mode,
            op,
            distance,
            limit,
            analyzer,
        } => {
            let analyzer = build_analyzer(analyzer);
            let (index, lines) = index_corpus(&corpus, &analyzer)?;
            let options = SearchOptions {
                mode: match mode {
                    ModeChoice::Exact => SearchMode::Exact,
                    ModeChoice::Prefix => SearchMode::Prefix,
                    ModeChoice::Fuzzy => SearchMode::Fuzzy,
                },
                operator: match op {
                    OpChoice::And => QueryOperator::And,
                    OpChoice::Or => QueryOperator::Or,
                },
                distance,
            };

            let found = index.search(&query, options, |text| analyzer.analyze(text));
            let ranked = index.rank(&found.tokens, &found.postings.to_sorted_vec());
            for hit in ranked.iter().take(limit.max(1)) {
                let line = Hit {
                    id: hit.id,
                    score: hit.score,
                    text: &lines[hit.id as usize],
                };
                println!("{}", serde_json::to_string(&line)?);
            }
            Ok(())
        }
        Commands::Stats { corpus, analyzer } => {
            let analyzer = build_analyzer(analyzer);
            let (index, lines) = index_corpus(&corpus, &analyzer)?;

            let mut by_df = index.term_stats();
            by_df.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            println!("documents: {}", lines.len());
            println!("terms: {}", index.term_count());
            for (term, df) in by_df.iter().take(10) {
                println!("{df:>8}  {term}");
            }
            Ok(())
        }
    }
}

fn build_analyzer(choice: AnalyzerChoice) -> Analyzer {
    match choice {
        AnalyzerChoice::Plain => Analyzer::plain(),
        AnalyzerChoice::English => Analyzer::english(),
    }
}

fn index_corpus(path: &str, analyzer: &Analyzer) -> Result<(SearchIndex, Vec<String>)> {
    let file = File::open(path).with_context(|| format!("open corpus file {path}"))?;
    let reader = BufReader::new(file);

    let mut builder = IndexBuilder::new();
    let mut lines = Vec::new();
    for (id, line) in reader.lines().enumerate() {
        let line = line?;
        let tokens = analyzer.analyze(&line);
        builder.add(&tokens, id as DocId);
        lines.push(line);
    }
    tracing::info!(documents = lines.len(), "corpus ingested");

    Ok((builder.build(), lines))
}
