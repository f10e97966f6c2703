//! Follower repository (the follower graph store).

use std::sync::Arc;
use std::time::Duration;

use crate::bounded::{
    DEFAULT_QUERY_TIMEOUT, bounded, bounded_map, classify_follow_fk, db_err, foreign_key_violation,
    unique_violation,
};
use crate::entities::{Follower, follower};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use social_common::{AppError, AppResult};

/// Follower repository for database operations.
///
/// An edge `(user_id, follower_id)` means `follower_id` follows `user_id`.
#[derive(Clone)]
pub struct FollowerRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

impl FollowerRepository {
    /// Create a new follower repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the per-operation deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record that `follower_id` follows `target_id`.
    ///
    /// An existing edge is reported as [`AppError::Conflict`] and left as is.
    /// A user deleted in the meantime is [`AppError::UserNotFound`].
    pub async fn follow(&self, target_id: i64, follower_id: i64) -> AppResult<()> {
        let edge = follower::ActiveModel {
            user_id: Set(target_id),
            follower_id: Set(follower_id),
            created_at: Set(Utc::now().into()),
        };

        bounded_map(
            "followers.follow",
            self.timeout,
            Follower::insert(edge).exec_without_returning(self.db.as_ref()),
            |err| {
                if unique_violation(&err).is_some() {
                    AppError::Conflict(format!(
                        "user {follower_id} already follows user {target_id}"
                    ))
                } else if let Some(message) = foreign_key_violation(&err) {
                    classify_follow_fk(&message, target_id, follower_id)
                } else {
                    db_err(err)
                }
            },
        )
        .await?;

        tracing::debug!(target_id, follower_id, "Follow edge created");
        Ok(())
    }

    /// Remove the edge if present. Removing a missing edge succeeds.
    pub async fn unfollow(&self, target_id: i64, follower_id: i64) -> AppResult<()> {
        let result = bounded(
            "followers.unfollow",
            self.timeout,
            Follower::delete_many()
                .filter(follower::Column::UserId.eq(target_id))
                .filter(follower::Column::FollowerId.eq(follower_id))
                .exec(self.db.as_ref()),
        )
        .await?;

        tracing::debug!(
            target_id,
            follower_id,
            removed = result.rows_affected,
            "Follow edge removed"
        );
        Ok(())
    }

    /// Check whether `follower_id` follows `target_id`.
    pub async fn is_following(&self, target_id: i64, follower_id: i64) -> AppResult<bool> {
        let edge = bounded(
            "followers.is_following",
            self.timeout,
            Follower::find_by_id((target_id, follower_id)).one(self.db.as_ref()),
        )
        .await?;
        Ok(edge.is_some())
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: i64) -> AppResult<u64> {
        bounded(
            "followers.count_followers",
            self.timeout,
            Follower::find()
                .filter(follower::Column::UserId.eq(user_id))
                .count(self.db.as_ref()),
        )
        .await
    }

    /// Count users a user follows.
    pub async fn count_following(&self, user_id: i64) -> AppResult<u64> {
        bounded(
            "followers.count_following",
            self.timeout,
            Follower::find()
                .filter(follower::Column::FollowerId.eq(user_id))
                .count(self.db.as_ref()),
        )
        .await
    }
}
