//! Post and comment endpoints.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use social_common::AppResult;
use social_core::{CreateCommentInput, CreatePostInput, PostWithComments, UpdatePostInput};
use social_db::entities::{comment, post as post_entity};

use crate::{
    extractors::{ApiJson, ApiPath},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

async fn create_post(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreatePostInput>,
) -> AppResult<ApiResponse<post_entity::Model>> {
    let post = state.post_service.create(input).await?;
    Ok(ApiResponse::created(post))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<ApiResponse<PostWithComments>> {
    let post = state.post_service.get(post_id).await?;
    Ok(ApiResponse::ok(post))
}

async fn update_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdatePostInput>,
) -> AppResult<ApiResponse<post_entity::Model>> {
    let post = state.post_service.update(post_id, input).await?;
    Ok(ApiResponse::ok(post))
}

async fn delete_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(post_id).await?;
    Ok(no_content())
}

async fn create_comment(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(input): ApiJson<CreateCommentInput>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state.post_service.add_comment(post_id, input).await?;
    Ok(ApiResponse::created(comment))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route(
            "/{post_id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/{post_id}/comments", post(create_comment))
}
