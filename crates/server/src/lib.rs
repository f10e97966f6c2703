//! Process wiring shared by the `social` and `social-seed` binaries.

use std::time::Duration;

use axum::Router;
use social_api::{AppState, router as api_router};
use social_common::{Config, config::LoggingConfig};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(logging: &LoggingConfig, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the full HTTP application with its middleware stack.
pub fn app(state: AppState, config: &Config) -> Router {
    api_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use social_common::config::{DatabaseConfig, MailConfig, ServerConfig};
    use social_core::LogMailer;
    use tower::ServiceExt;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                api_url: "localhost".to_string(),
                env: "development".to_string(),
                request_timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 1,
                min_connections: 1,
                idle_timeout_secs: 60,
                query_timeout_secs: 5,
            },
            mail: MailConfig::default(),
            logging: LoggingConfig::default(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }

    #[tokio::test]
    async fn test_app_serves_health_with_cors() {
        let config = config();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let state = AppState::new(db, Arc::new(LogMailer), &config);

        let response = app(state, &config)
            .oneshot(
                Request::builder()
                    .uri("/v1/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
