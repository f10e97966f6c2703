//! Post service.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use social_common::{AppError, AppResult};
use social_db::{
    entities::{comment, post},
    repositories::{CommentRepository, CommentWithAuthor, NewPost, PostRepository, UserRepository},
};
use validator::Validate;

/// Attempts made by an update that did not pin a version.
pub const DEFAULT_UPDATE_ATTEMPTS: u32 = 3;

/// Trim, drop empties, de-duplicate and sort a tag list.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    pub user_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating a post.
///
/// With `version` set the write is attempted once against that version;
/// without it the service reloads and retries on conflict.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub version: Option<i32>,
}

impl UpdatePostInput {
    fn apply_to(&self, post: &mut post::Model) {
        if let Some(title) = &self.title {
            post.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            post.content.clone_from(content);
        }
        if let Some(tags) = &self.tags {
            post.tags = normalize_tags(tags);
        }
    }
}

/// Input for commenting on a post.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentInput {
    pub user_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

/// A post with its comments, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: post::Model,
    pub comments: Vec<CommentWithAuthor>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    user_repo: UserRepository,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            user_repo,
        }
    }

    /// Create a post.
    pub async fn create(&self, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;
        self.user_repo.get_by_id(input.user_id).await?;

        let post = self
            .post_repo
            .create(NewPost {
                user_id: input.user_id,
                title: input.title,
                content: input.content,
                tags: normalize_tags(&input.tags),
            })
            .await?;

        tracing::info!(post_id = post.id, user_id = post.user_id, "Post created");
        Ok(post)
    }

    /// Get a post with its comments.
    pub async fn get(&self, id: i64) -> AppResult<PostWithComments> {
        let post = self.post_repo.get_by_id(id).await?;
        let comments = self.comment_repo.find_by_post(id).await?;
        Ok(PostWithComments { post, comments })
    }

    /// Update a post.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let Some(expected) = input.version else {
            return self
                .update_with_retry(id, &input, DEFAULT_UPDATE_ATTEMPTS)
                .await;
        };

        let mut post = self.post_repo.get_by_id(id).await?;
        input.apply_to(&mut post);
        post.version = expected;
        self.post_repo.update(&post).await
    }

    /// Reload and retry on version conflict, up to `max_attempts` writes.
    pub async fn update_with_retry(
        &self,
        id: i64,
        input: &UpdatePostInput,
        max_attempts: u32,
    ) -> AppResult<post::Model> {
        let mut attempt = 1;
        loop {
            let mut post = self.post_repo.get_by_id(id).await?;
            input.apply_to(&mut post);

            match self.post_repo.update(&post).await {
                Err(AppError::VersionConflict { expected, .. }) if attempt < max_attempts => {
                    tracing::debug!(post_id = id, expected, attempt, "Version conflict, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Delete a post.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.post_repo.delete_by_id(id).await?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    /// Comment on an existing post.
    pub async fn add_comment(
        &self,
        post_id: i64,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        self.post_repo.get_by_id(post_id).await?;
        self.user_repo.get_by_id(input.user_id).await?;

        self.comment_repo
            .create(post_id, input.user_id, input.content)
            .await
    }
}
