//! Operation deadlines and store error classification.
//!
//! Every store call goes through [`bounded`], which races it against a
//! deadline. A timed-out future is dropped, so an open transaction it was
//! driving rolls back when its handle goes out of scope.

use std::future::Future;
use std::time::Duration;

use sea_orm::{DbErr, SqlErr};
use social_common::{AppError, AppResult};

/// Deadline applied when a repository is not configured otherwise.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Unique index on `users.username`.
pub const USERS_USERNAME_INDEX: &str = "idx_users_username";

/// Unique index on `users.email`.
pub const USERS_EMAIL_INDEX: &str = "idx_users_email";

/// Foreign key from `followers.follower_id` to `users.id`.
pub const FOLLOWERS_FOLLOWER_FK: &str = "fk_followers_follower";

/// Run a store future under a deadline, mapping errors to [`AppError::Database`].
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = Result<T, DbErr>>,
{
    bounded_map(operation, limit, fut, db_err).await
}

/// Run a store future under a deadline with a custom error classifier.
pub async fn bounded_map<T, F, M>(
    operation: &'static str,
    limit: Duration,
    fut: F,
    classify: M,
) -> AppResult<T>
where
    F: Future<Output = Result<T, DbErr>>,
    M: FnOnce(DbErr) -> AppError,
{
    deadline(operation, limit, async { fut.await.map_err(classify) }).await
}

/// Race a whole unit of work against a deadline.
///
/// Expiry yields [`AppError::Timeout`] naming `operation`.
pub async fn deadline<T, F>(operation: &'static str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    if let Ok(result) = tokio::time::timeout(limit, fut).await {
        result
    } else {
        tracing::warn!(
            operation,
            timeout_ms = limit.as_millis() as u64,
            "Store operation timed out"
        );
        Err(AppError::Timeout(operation.to_string()))
    }
}

/// Map any database error to [`AppError::Database`].
#[must_use]
pub fn db_err(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}

/// The driver message of a unique-constraint violation, if `err` is one.
#[must_use]
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}

/// The driver message of a foreign-key violation, if `err` is one.
#[must_use]
pub fn foreign_key_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(message)) => Some(message),
        _ => None,
    }
}

/// Classify a foreign-key violation raised by an insert into `followers`:
/// whichever side's user row is gone is reported missing.
#[must_use]
pub fn classify_follow_fk(message: &str, target_id: i64, follower_id: i64) -> AppError {
    if message.contains(FOLLOWERS_FOLLOWER_FK) {
        AppError::UserNotFound(follower_id.to_string())
    } else {
        AppError::UserNotFound(target_id.to_string())
    }
}

/// Classify a unique-violation message raised by an insert into `users`.
#[must_use]
pub fn classify_user_conflict(message: &str) -> AppError {
    if message.contains(USERS_EMAIL_INDEX) {
        AppError::DuplicateEmail
    } else if message.contains(USERS_USERNAME_INDEX) {
        AppError::DuplicateUsername
    } else {
        AppError::Conflict(message.to_string())
    }
}

/// Error classifier for user inserts.
#[must_use]
pub fn user_insert_err(err: DbErr) -> AppError {
    match unique_violation(&err) {
        Some(message) => classify_user_conflict(&message),
        None => db_err(err),
    }
}
