//! Shared application state.

#![allow(missing_docs)]

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use social_common::Config;
use social_core::{
    AccountService, FeedService, FollowingService, PostService, ProvisioningSettings,
    SharedNotificationSender, UserService,
};
use social_db::repositories::{
    CommentRepository, FeedRepository, FollowerRepository, PostRepository, UserRepository,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub following_service: FollowingService,
    pub post_service: PostService,
    pub feed_service: FeedService,
    pub account_service: AccountService,
    /// Deployment environment, reported by the health check.
    pub env: String,
}

impl AppState {
    /// Wire every service to one connection pool and mail sender.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        mailer: SharedNotificationSender,
        config: &Config,
    ) -> Self {
        let timeout = config.database.query_timeout();

        let user_repo = UserRepository::new(Arc::clone(&db)).with_timeout(timeout);
        let follower_repo = FollowerRepository::new(Arc::clone(&db)).with_timeout(timeout);
        let post_repo = PostRepository::new(Arc::clone(&db)).with_timeout(timeout);
        let comment_repo = CommentRepository::new(Arc::clone(&db)).with_timeout(timeout);
        let feed_repo = FeedRepository::new(Arc::clone(&db)).with_timeout(timeout);

        Self {
            user_service: UserService::new(user_repo.clone(), follower_repo.clone()),
            following_service: FollowingService::new(follower_repo, user_repo.clone()),
            post_service: PostService::new(post_repo, comment_repo, user_repo),
            feed_service: FeedService::new(feed_repo),
            account_service: AccountService::new(
                db,
                mailer,
                ProvisioningSettings::from_config(config),
            ),
            env: config.server.env.clone(),
        }
    }
}
