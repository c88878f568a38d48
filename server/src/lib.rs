use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use spindle_core::index::InvertedIndex;
use spindle_core::persist::{load_snapshot, ArtifactPaths};
use spindle_core::query::{BooleanQuery, FreeTextQuery, SearchQuery};
use spindle_core::rank::{ContentRanker, PageRank, RankOptions};
use spindle_core::DocId;

/// Startup knobs mirroring the offline query pipeline: champion list size
/// and PageRank parameters.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub champion_list_size: usize,
    pub pagerank_alpha: f64,
    pub pagerank_max_iterations: usize,
    pub pagerank_weight: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            champion_list_size: 20,
            pagerank_alpha: 0.15,
            pagerank_max_iterations: 100,
            pagerank_weight: 0.5,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    index: Arc<InvertedIndex>,
    pagerank: Arc<HashMap<String, f64>>,
    config: Arc<SearchConfig>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    /// Blend PageRank into the content score.
    #[serde(default)]
    pub pagerank: bool,
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
    pub url: String,
    pub score: f64,
}

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub urls: Vec<String>,
}

/// Load the crawl artifacts, build the in-memory index in sorted-URL order
/// (deterministic doc ids), recompute champion lists and run PageRank once,
/// then expose the query API.
pub fn build_app(artifacts_dir: &str, config: SearchConfig) -> Result<Router> {
    let snapshot = load_snapshot(&ArtifactPaths::new(artifacts_dir))?;

    let mut index = InvertedIndex::new();
    index.index_corpus(&snapshot.contents);
    index.update_champions(config.champion_list_size);
    tracing::info!(docs = index.num_docs(), "indexed crawl artifacts");

    let pagerank: HashMap<String, f64> = PageRank::new(&snapshot.references)
        .rank(config.pagerank_alpha, config.pagerank_max_iterations)
        .into_iter()
        .collect();

    let state = AppState {
        index: Arc::new(index),
        pagerank: Arc::new(pagerank),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .with_state(state)
        .layer(cors))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let query = FreeTextQuery::new(&state.index, &params.q);
    let options = RankOptions {
        use_champions: true,
        auxiliary: params.pagerank.then(|| state.pagerank.as_ref()),
        auxiliary_weight: state.config.pagerank_weight,
    };
    let ranker = ContentRanker::new(&query, &state.index, &options);
    let k = params.k.clamp(1, 100);
    let results = ranker
        .top(k)
        .iter()
        .map(|doc| SearchHit {
            url: doc.url.clone(),
            score: doc.score,
        })
        .collect();
    Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: ranker.len(),
        results,
    })
}

pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<BooleanParams>,
) -> Result<Json<BooleanResponse>, (StatusCode, String)> {
    let query = BooleanQuery::parse(&state.index, &params.q)
        .map_err(|error| (StatusCode::BAD_REQUEST, format!("bad query: {error}")))?;
    let mut docs: Vec<DocId> = query.matches().iter().copied().collect();
    docs.sort_unstable();
    let urls = docs
        .into_iter()
        .filter_map(|doc| state.index.url(doc).map(str::to_string))
        .collect();
    Ok(Json(BooleanResponse {
        query: params.q,
        urls,
    }))
}
