//! Post repository (the optimistic post store).

use std::sync::Arc;
use std::time::Duration;

use crate::bounded::{DEFAULT_QUERY_TIMEOUT, bounded};
use crate::entities::{Post, post};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use social_common::{AppError, AppResult};

/// Fields supplied by the author of a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Author user ID.
    pub user_id: i64,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Normalized tag set.
    pub tags: Vec<String>,
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

impl PostRepository {
    /// Create a new post repository.
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

    /// Insert a post. The store assigns the ID; version starts at 1.
    pub async fn create(&self, input: NewPost) -> AppResult<post::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let model = post::ActiveModel {
            user_id: Set(input.user_id),
            title: Set(input.title),
            content: Set(input.content),
            tags: Set(input.tags),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        bounded("posts.create", self.timeout, model.insert(self.db.as_ref())).await
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<post::Model>> {
        bounded(
            "posts.find_by_id",
            self.timeout,
            Post::find_by_id(id).one(self.db.as_ref()),
        )
        .await
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Write `post`'s title, content and tags if its version is still current.
    ///
    /// The version check and the write are a single conditional `UPDATE`.
    /// When no row matches, [`AppError::VersionConflict`] is returned and
    /// nothing is written. On success the returned post carries the bumped
    /// version.
    pub async fn update(&self, post: &post::Model) -> AppResult<post::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let result = bounded(
            "posts.update",
            self.timeout,
            Post::update_many()
                .col_expr(post::Column::Title, Expr::value(post.title.clone()))
                .col_expr(post::Column::Content, Expr::value(post.content.clone()))
                .col_expr(post::Column::Tags, Expr::value(post.tags.clone()))
                .col_expr(post::Column::UpdatedAt, Expr::value(now))
                .col_expr(
                    post::Column::Version,
                    Expr::col(post::Column::Version).add(1),
                )
                .filter(post::Column::Id.eq(post.id))
                .filter(post::Column::Version.eq(post.version))
                .exec(self.db.as_ref()),
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(AppError::VersionConflict {
                id: post.id,
                expected: post.version,
            });
        }

        Ok(post::Model {
            version: post.version + 1,
            updated_at: now,
            ..post.clone()
        })
    }

    /// Delete a post by ID.
    pub async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        let result = bounded(
            "posts.delete",
            self.timeout,
            Post::delete_by_id(id).exec(self.db.as_ref()),
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(AppError::PostNotFound(id.to_string()));
        }
        Ok(())
    }
}
