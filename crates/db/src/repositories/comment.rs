//! Comment repository.

use std::sync::Arc;
use std::time::Duration;

use crate::bounded::{DEFAULT_QUERY_TIMEOUT, bounded};
use crate::entities::{Comment, comment, user};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;
use social_common::AppResult;

/// A comment joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub username: String,
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

impl CommentRepository {
    /// Create a new comment repository.
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

    /// Append a comment to a post.
    pub async fn create(
        &self,
        post_id: i64,
        user_id: i64,
        content: String,
    ) -> AppResult<comment::Model> {
        let model = comment::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            content: Set(content),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        bounded("comments.create", self.timeout, model.insert(self.db.as_ref())).await
    }

    /// Comments on a post, oldest first, with author usernames.
    pub async fn find_by_post(&self, post_id: i64) -> AppResult<Vec<CommentWithAuthor>> {
        bounded(
            "comments.find_by_post",
            self.timeout,
            Comment::find()
                .select_only()
                .columns([
                    comment::Column::Id,
                    comment::Column::PostId,
                    comment::Column::UserId,
                    comment::Column::Content,
                    comment::Column::CreatedAt,
                ])
                .column_as(user::Column::Username, "username")
                .join(JoinType::InnerJoin, comment::Relation::User.def())
                .filter(comment::Column::PostId.eq(post_id))
                .order_by_asc(comment::Column::CreatedAt)
                .order_by_asc(comment::Column::Id)
                .into_model::<CommentWithAuthor>()
                .all(self.db.as_ref()),
        )
        .await
    }

    /// Count comments on a post.
    pub async fn count_by_post(&self, post_id: i64) -> AppResult<u64> {
        bounded(
            "comments.count_by_post",
            self.timeout,
            Comment::find()
                .filter(comment::Column::PostId.eq(post_id))
                .count(self.db.as_ref()),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[tokio::test]
    async fn test_find_by_post_includes_username() {
        let created_at: DateTimeWithTimeZone = Utc::now().into();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "id" => Value::from(1_i64),
                    "post_id" => Value::from(5_i64),
                    "user_id" => Value::from(2_i64),
                    "content" => Value::from("Nice post"),
                    "created_at" => Value::from(created_at),
                    "username" => Value::from("alice"),
                }]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let comments = repo.find_by_post(5).await.unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].username, "alice");
        assert_eq!(comments[0].content, "Nice post");
    }

    #[tokio::test]
    async fn test_create_comment() {
        let row = comment::Model {
            id: 10,
            post_id: 5,
            user_id: 2,
            content: "Nice post".to_string(),
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let created = repo.create(5, 2, "Nice post".to_string()).await.unwrap();
        assert_eq!(created.id, 10);
    }

    #[tokio::test]
    async fn test_count_by_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert_eq!(repo.count_by_post(5).await.unwrap(), 4);
    }
}
