//! Following service.

use social_common::AppResult;
use social_db::repositories::{FollowerRepository, UserRepository};

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    follower_repo: FollowerRepository,
    user_repo: UserRepository,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(follower_repo: FollowerRepository, user_repo: UserRepository) -> Self {
        Self {
            follower_repo,
            user_repo,
        }
    }

    /// Make `follower_id` follow `target_id`.
    ///
    /// Following someone twice is [`social_common::AppError::Conflict`].
    pub async fn follow(&self, target_id: i64, follower_id: i64) -> AppResult<()> {
        self.user_repo.get_by_id(target_id).await?;
        self.user_repo.get_by_id(follower_id).await?;

        self.follower_repo.follow(target_id, follower_id).await?;
        tracing::info!(target_id, follower_id, "User followed");
        Ok(())
    }

    /// Make `follower_id` stop following `target_id`. Idempotent.
    pub async fn unfollow(&self, target_id: i64, follower_id: i64) -> AppResult<()> {
        self.user_repo.get_by_id(target_id).await?;
        self.user_repo.get_by_id(follower_id).await?;

        self.follower_repo.unfollow(target_id, follower_id).await?;
        tracing::info!(target_id, follower_id, "User unfollowed");
        Ok(())
    }

    /// Check whether `follower_id` follows `target_id`.
    pub async fn is_following(&self, target_id: i64, follower_id: i64) -> AppResult<bool> {
        self.follower_repo.is_following(target_id, follower_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use social_common::AppError;
    use social_db::entities::user;
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> FollowingService {
        let db = Arc::new(db);
        FollowingService::new(
            FollowerRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    fn test_user(id: i64) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_follow_existing_users() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_user(1)], [test_user(43)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert!(service(db).follow(1, 43).await.is_ok());
    }

    #[tokio::test]
    async fn test_follow_missing_target() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = service(db).follow(1, 43).await;
        assert!(matches!(result, Err(AppError::UserNotFound(id)) if id == "1"));
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_succeeds() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_user(1)], [test_user(43)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(service(db).unfollow(1, 43).await.is_ok());
    }
}
