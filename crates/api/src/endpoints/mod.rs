//! API endpoints.

mod auth;
mod health;
mod posts;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router, rooted at `/v1`.
pub fn router() -> Router<AppState> {
    let v1 = Router::new()
        .merge(health::router())
        .nest("/authentication", auth::router())
        .nest("/users", users::router())
        .nest("/posts", posts::router());

    Router::new().nest("/v1", v1)
}
