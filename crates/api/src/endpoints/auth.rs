//! Registration endpoint.

use axum::{Router, extract::State, routing::post};
use social_common::AppResult;
use social_core::{ProvisionedAccount, RegisterUserInput};

use crate::{extractors::ApiJson, middleware::AppState, response::ApiResponse};

/// Register a user and send the invitation.
///
/// The response carries the plaintext token so clients without mail access
/// can still activate.
async fn register_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterUserInput>,
) -> AppResult<ApiResponse<ProvisionedAccount>> {
    let account = state.account_service.register(input).await?;
    Ok(ApiResponse::created(account))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/user", post(register_user))
}
