//! User service.

use serde::Serialize;
use social_common::AppResult;
use social_db::{
    entities::user,
    repositories::{FollowerRepository, UserRepository},
};

/// A user with follow-graph counts.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: user::Model,
    pub followers_count: u64,
    pub following_count: u64,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    follower_repo: FollowerRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, follower_repo: FollowerRepository) -> Self {
        Self {
            user_repo,
            follower_repo,
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i64) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user with follower and following counts.
    pub async fn profile(&self, id: i64) -> AppResult<UserProfile> {
        let user = self.user_repo.get_by_id(id).await?;
        let followers_count = self.follower_repo.count_followers(id).await?;
        let following_count = self.follower_repo.count_following(id).await?;

        Ok(UserProfile {
            user,
            followers_count,
            following_count,
        })
    }
}
