use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use likeledger_types::{LikeSummary, PostId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/likes/{post_id}", get(get_likes).post(add_like))
        .route("/api/likes/{post_id}/{address}", get(has_liked))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    posts: usize,
    likes: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.ledger.stats().await;
    Json(HealthResponse {
        status: "ok",
        posts: stats.posts,
        likes: stats.likes,
    })
}

async fn get_likes(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<LikeSummary>> {
    let post = PostId::parse(&post_id)?;
    Ok(Json(state.ledger.get_likes(&post).await))
}

#[derive(Deserialize)]
struct LikeRequest {
    #[serde(default)]
    address: Option<String>,
}

#[derive(Serialize)]
struct LikeResponse {
    count: usize,
    liked: bool,
}

async fn add_like(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(req): Json<LikeRequest>,
) -> ApiResult<Json<LikeResponse>> {
    let post = PostId::parse(&post_id)?;
    let address = req
        .address
        .ok_or_else(|| ApiError::InvalidInput("missing field `address`".into()))?;

    let outcome = state.ledger.add_like(&post, &address).await?;
    Ok(Json(LikeResponse {
        count: outcome.count,
        liked: outcome.liked,
    }))
}

#[derive(Serialize)]
struct HasLikedResponse {
    liked: bool,
}

async fn has_liked(
    State(state): State<AppState>,
    Path((post_id, address)): Path<(String, String)>,
) -> ApiResult<Json<HasLikedResponse>> {
    let post = PostId::parse(&post_id)?;
    let liked = state.ledger.has_liked(&post, &address).await?;
    Ok(Json(HasLikedResponse { liked }))
}
