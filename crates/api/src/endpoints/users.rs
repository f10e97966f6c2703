//! User endpoints: profile, activation, follows and feed.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;
use social_common::AppResult;
use social_core::{FeedParams, FeedQuery, UserProfile};
use social_db::repositories::FeedRow;

use crate::{
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Follow/unfollow request body. `user_id` is the acting follower.
#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub user_id: i64,
}

async fn activate(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> AppResult<impl IntoResponse> {
    state.account_service.activate(&token).await?;
    Ok(no_content())
}

async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.user_service.profile(user_id).await?;
    Ok(ApiResponse::ok(profile))
}

/// The path user is followed by the body user.
async fn follow(
    State(state): State<AppState>,
    ApiPath(target_id): ApiPath<i64>,
    ApiJson(req): ApiJson<FollowRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .following_service
        .follow(target_id, req.user_id)
        .await?;
    Ok(no_content())
}

async fn unfollow(
    State(state): State<AppState>,
    ApiPath(target_id): ApiPath<i64>,
    ApiJson(req): ApiJson<FollowRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .following_service
        .unfollow(target_id, req.user_id)
        .await?;
    Ok(no_content())
}

async fn feed(
    State(state): State<AppState>,
    ApiPath(viewer_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<FeedParams>,
) -> AppResult<ApiResponse<Vec<FeedRow>>> {
    let query = FeedQuery::parse(&params)?;
    let rows = state.feed_service.get_feed(viewer_id, &query).await?;
    Ok(ApiResponse::ok(rows))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activate/{token}", put(activate))
        .route("/{user_id}", get(get_user))
        .route("/{user_id}/follow", put(follow))
        .route("/{user_id}/unfollow", put(unfollow))
        .route("/{user_id}/feed", get(feed))
}
