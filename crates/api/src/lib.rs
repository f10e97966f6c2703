//! HTTP API layer for the social backend.
//!
//! - **Endpoints**: health, registration and activation, users, follows,
//!   feed, posts and comments, all under `/v1`
//! - **Extractors**: JSON bodies and path parameters whose rejections use
//!   the application error envelope
//! - **State**: the services shared by every handler
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
