//! Feed repository: posts visible to a viewer through the follower graph.
//!
//! Filters arrive as a list of [`FeedPredicate`]s and are compiled into one
//! sea-query [`Condition`]. User input only ever reaches the database as
//! bound values.

use std::sync::Arc;
use std::time::Duration;

use crate::bounded::{DEFAULT_QUERY_TIMEOUT, bounded};
use crate::entities::{Post, comment, follower, post, user};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, extension::postgres::PgBinOper},
};
use serde::Serialize;
use social_common::AppResult;

/// Sort direction on `created_at` (ties broken by `id` in the same direction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

/// One filter applied to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPredicate {
    /// Author is followed by this viewer.
    FollowedBy(i64),
    /// Post carries every one of these tags.
    HasAllTags(Vec<String>),
    /// Title or content contains this text, case-insensitively.
    TextContains(String),
    /// Created at or after this instant.
    CreatedSince(DateTime<Utc>),
    /// Created strictly before this instant.
    CreatedBefore(DateTime<Utc>),
}

impl FeedPredicate {
    fn apply(&self, condition: Condition) -> Condition {
        match self {
            Self::FollowedBy(viewer_id) => condition.add(
                Expr::col((follower::Entity, follower::Column::FollowerId)).eq(*viewer_id),
            ),
            Self::HasAllTags(tags) => condition.add(
                Expr::col((post::Entity, post::Column::Tags))
                    .binary(PgBinOper::Contains, Expr::val(tags.clone())),
            ),
            Self::TextContains(text) => {
                let pattern = format!("%{}%", escape_like(text));
                condition.add(
                    Condition::any()
                        .add(
                            Expr::col((post::Entity, post::Column::Title))
                                .binary(PgBinOper::ILike, Expr::val(pattern.clone())),
                        )
                        .add(
                            Expr::col((post::Entity, post::Column::Content))
                                .binary(PgBinOper::ILike, Expr::val(pattern)),
                        ),
                )
            }
            Self::CreatedSince(since) => condition.add(post::Column::CreatedAt.gte(*since)),
            Self::CreatedBefore(until) => condition.add(post::Column::CreatedAt.lt(*until)),
        }
    }
}

/// Escape `LIKE` metacharacters so `text` matches literally.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compile a predicate list into a single conjunctive condition.
#[must_use]
pub fn compile_predicates(predicates: &[FeedPredicate]) -> Condition {
    predicates
        .iter()
        .fold(Condition::all(), |condition, predicate| predicate.apply(condition))
}

/// A post as it appears in a feed.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct FeedRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    /// Author username.
    pub username: String,
    /// Number of comments on the post.
    pub comment_count: i64,
}

/// Feed repository for database operations.
#[derive(Clone)]
pub struct FeedRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

impl FeedRepository {
    /// Create a new feed repository.
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

    /// Fetch one page of the feed.
    pub async fn fetch(
        &self,
        predicates: &[FeedPredicate],
        sort: SortDirection,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<FeedRow>> {
        bounded(
            "posts.feed",
            self.timeout,
            feed_select(predicates, sort)
                .offset(offset)
                .limit(limit)
                .into_model::<FeedRow>()
                .all(self.db.as_ref()),
        )
        .await
    }
}

/// Posts joined with the follow edges of their authors, the author row and
/// the post's comments, filtered, grouped per post and ordered.
pub(crate) fn feed_select(predicates: &[FeedPredicate], sort: SortDirection) -> Select<Post> {
    let order: Order = sort.into();

    Post::find()
        .select_only()
        .columns([
            post::Column::Id,
            post::Column::UserId,
            post::Column::Title,
            post::Column::Content,
            post::Column::Tags,
            post::Column::Version,
            post::Column::CreatedAt,
            post::Column::UpdatedAt,
        ])
        .column_as(user::Column::Username, "username")
        .column_as(
            Expr::col((comment::Entity, comment::Column::Id)).count(),
            "comment_count",
        )
        .join(JoinType::InnerJoin, post::Relation::AuthorFollowers.def())
        .join(JoinType::LeftJoin, post::Relation::User.def())
        .join(JoinType::LeftJoin, post::Relation::Comments.def())
        .filter(compile_predicates(predicates))
        .group_by(post::Column::Id)
        .group_by(user::Column::Username)
        .order_by(post::Column::CreatedAt, order.clone())
        .order_by(post::Column::Id, order)
}
