use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use searchlite_core::tokenizer::Analyzer;
use searchlite_server::{build_app, AppState};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "searchlite-test-boundary";

fn multipart_upload(corpus: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"corpus\"; filename=\"corpus.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {corpus}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::post("/corpus")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

const CORPUS: &str = include_str!("fixtures/corpus.txt");

#[tokio::test]
async fn search_before_upload_is_unavailable() {
    let app = build_app(Analyzer::plain());
    let (status, _) = call(&app, get("/search?q=fox")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn upload_then_search_returns_ranked_results() {
    let app = build_app(Analyzer::plain());

    let (status, body) = call(&app, multipart_upload(CORPUS)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"].as_u64().unwrap(), 8);
    assert!(body["terms"].as_u64().unwrap() > 0);

    let (status, body) = call(&app, get("/search?q=quick+dog&op=and")).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"].as_u64().unwrap(), 2);
    assert_eq!(results[0]["text"].as_str().unwrap(), "quick dog");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn search_modes_and_limits_are_honored() {
    let app = build_app(Analyzer::plain());
    call(&app, multipart_upload(CORPUS)).await;

    let (status, body) = call(&app, get("/search?q=great&mode=prefix")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["id"].as_u64().unwrap())
        .collect();
    assert!(ids.contains(&3) && ids.contains(&4), "greatness and greater docs: {ids:?}");

    let (status, body) = call(&app, get("/search?q=memorble&mode=fuzzy&distance=2")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["id"].as_u64().unwrap())
        .collect();
    assert!(ids.contains(&5), "memorable doc matches a typo: {ids:?}");

    let (_, body) = call(&app, get("/search?q=the&k=1")).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert!(body["total_hits"].as_u64().unwrap() > 1);
}

#[tokio::test]
async fn doc_endpoint_returns_corpus_lines() {
    let app = build_app(Analyzer::plain());
    call(&app, multipart_upload(CORPUS)).await;

    let (status, body) = call(&app, get("/doc/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"].as_str().unwrap(), "quick dog");

    let (status, _) = call(&app, get("/doc/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_corpus_field_is_rejected() {
    let app = build_app(Analyzer::plain());
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         data\r\n\
         --{BOUNDARY}--\r\n"
    );
    let request = Request::post("/corpus")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = call(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reupload_replaces_the_index_atomically() {
    let state = AppState::new(Analyzer::plain());
    let app = searchlite_server::app_with_state(state.clone());

    call(&app, multipart_upload("alpha beta\ngamma")).await;
    let before = state.snapshot().unwrap();

    call(&app, multipart_upload("delta epsilon")).await;

    // The old snapshot still answers from the old corpus.
    let found = before.index.search(
        "alpha",
        Default::default(),
        searchlite_core::tokenize,
    );
    assert_eq!(found.postings.to_sorted_vec(), vec![0]);
    assert_eq!(before.corpus.len(), 2);

    // New queries see only the new corpus.
    let (_, body) = call(&app, get("/search?q=alpha")).await;
    assert_eq!(body["total_hits"].as_u64().unwrap(), 0);
    let (_, body) = call(&app, get("/search?q=delta")).await;
    assert_eq!(body["total_hits"].as_u64().unwrap(), 1);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = build_app(Analyzer::plain());
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
