use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use lexis::SearchEngine;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// Defaults to the engine's configured `top_k`.
    pub k: Option<usize>,
    /// Wrap query-related words of each snippet in `<em>`.
    #[serde(default)]
    pub highlight: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub suggestion: String,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub name: String,
    pub score: f64,
    pub snippet: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

/// CORS from `CORS_ALLOW_ORIGIN` (comma-separated), any origin when unset or unparsable.
fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_app(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:name", get(doc_handler))
        .with_state(AppState { engine })
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let engine = &state.engine;
    let k = params.k.unwrap_or(engine.config().top_k).clamp(1, 100);
    let query = engine.query(&params.q);
    let result = engine.search_query(&query, k);

    let pattern = if params.highlight { highlight_pattern(&query) } else { None };
    let results = result
        .items
        .into_iter()
        .map(|item| {
            let snippet = match &pattern {
                Some(re) => re.replace_all(&item.snippet, "<em>$0</em>").into_owned(),
                None => item.snippet,
            };
            SearchHit { name: item.name, score: item.score, snippet }
        })
        .collect();

    Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: result.total_hits,
        suggestion: result.suggestion,
        results,
    })
}

/// Case-insensitive whole-word pattern over every vocabulary word the query expanded to.
fn highlight_pattern(query: &lexis::Query) -> Option<regex::Regex> {
    let mut words: Vec<&str> = query.expanded().keys().map(String::as_str).collect();
    if words.is_empty() {
        return None;
    }
    // longest first so alternation prefers whole words
    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()
        .map_err(|err| tracing::warn!(error = %err, "highlight pattern rejected"))
        .ok()
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.engine.document(&name) {
        Some(meta) => Ok(Json(serde_json::json!({
            "name": meta.name,
            "path": meta.path,
            "token_count": meta.token_count,
            "text": meta.text,
        }))),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
    }
}
