use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use searchlite_core::index::{
    DocId, IndexBuilder, QueryOperator, SearchIndex, SearchMode, SearchOptions,
};
use searchlite_core::tokenizer::Analyzer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A built index together with the corpus lines it was built from. The two
/// are published as one unit so readers never see an index paired with a
/// mismatched corpus.
pub struct CorpusIndex {
    pub index: SearchIndex,
    pub corpus: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    current: Arc<RwLock<Option<Arc<CorpusIndex>>>>,
    analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            analyzer: Arc::new(analyzer),
        }
    }

    /// Consistent view of the currently published index. Queries run against
    /// the snapshot, so a concurrent rebuild cannot mix state mid-query.
    pub fn snapshot(&self) -> Option<Arc<CorpusIndex>> {
        self.current.read().clone()
    }

    /// Publish a freshly built index with a single handle swap.
    pub fn install(&self, next: CorpusIndex) {
        *self.current.write() = Some(Arc::new(next));
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub op: QueryOperator,
    #[serde(default)]
    pub distance: u32,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f64,
    pub text: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub documents: usize,
    pub terms: usize,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub id: DocId,
    pub text: String,
}

pub fn build_app(analyzer: Analyzer) -> Router {
    app_with_state(AppState::new(analyzer))
}

pub fn app_with_state(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/corpus", post(upload_corpus))
        .route("/search", get(search_handler))
        .route("/doc/:id", get(doc_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(cors)
}

/// Accept a multipart upload with a `corpus` field, index one document per
/// line off to the side, then publish the result atomically. The previous
/// index keeps serving until the swap.
pub async fn upload_corpus(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?
    {
        if field.name() != Some("corpus") {
            continue;
        }
        let data = field
            .text()
            .await
            .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

        let mut builder = IndexBuilder::new();
        let mut corpus = Vec::new();
        for (id, line) in data.lines().enumerate() {
            let tokens = state.analyzer.analyze(line);
            builder.add(&tokens, id as DocId);
            corpus.push(line.to_string());
        }

        let index = builder.build();
        let response = UploadResponse {
            documents: corpus.len(),
            terms: index.term_count(),
        };
        state.install(CorpusIndex { index, corpus });
        tracing::info!(documents = response.documents, terms = response.terms, "corpus indexed");
        return Ok(Json(response));
    }

    Err((StatusCode::BAD_REQUEST, "missing multipart field \"corpus\"".to_string()))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let Some(snapshot) = state.snapshot() else {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "no corpus indexed yet".to_string()));
    };
    let start = Instant::now();

    let options = SearchOptions {
        mode: params.mode,
        operator: params.op,
        distance: params.distance,
    };
    let found = snapshot
        .index
        .search(&params.q, options, |text| state.analyzer.analyze(text));
    let ranked = snapshot.index.rank(&found.tokens, &found.postings.to_sorted_vec());

    let total_hits = ranked.len();
    let k = params.k.clamp(1, 100);
    let results = ranked
        .into_iter()
        .take(k)
        .map(|hit| SearchHit {
            id: hit.id,
            score: hit.score,
            text: snapshot.corpus[hit.id as usize].clone(),
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits,
        results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(id): Path<DocId>,
) -> Result<Json<DocResponse>, StatusCode> {
    let snapshot = state.snapshot().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let text = snapshot
        .corpus
        .get(id as usize)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(DocResponse {
        id,
        text: text.clone(),
    }))
}
