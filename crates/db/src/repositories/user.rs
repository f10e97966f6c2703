//! User repository (the identity store).

use std::sync::Arc;
use std::time::Duration;

use crate::bounded::{DEFAULT_QUERY_TIMEOUT, bounded, bounded_map, user_insert_err};
use crate::entities::{User, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::Expr,
};
use social_common::{AppError, AppResult};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

impl UserRepository {
    /// Create a new user repository.
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

    /// Insert a user inside the caller's unit of work.
    ///
    /// A duplicate username or email is reported as
    /// [`AppError::DuplicateUsername`] or [`AppError::DuplicateEmail`].
    pub async fn insert<C>(&self, conn: &C, model: user::ActiveModel) -> AppResult<user::Model>
    where
        C: ConnectionTrait,
    {
        bounded_map("users.insert", self.timeout, model.insert(conn), user_insert_err).await
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        bounded(
            "users.find_by_id",
            self.timeout,
            User::find_by_id(id).one(self.db.as_ref()),
        )
        .await
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        bounded(
            "users.find_by_username",
            self.timeout,
            User::find()
                .filter(user::Column::Username.eq(username))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        bounded(
            "users.find_by_email",
            self.timeout,
            User::find()
                .filter(user::Column::Email.eq(email))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Mark a user active.
    pub async fn activate<C>(&self, conn: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = bounded(
            "users.activate",
            self.timeout,
            User::update_many()
                .col_expr(user::Column::IsActive, Expr::value(true))
                .filter(user::Column::Id.eq(id))
                .exec(conn),
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a user row.
    pub async fn delete<C>(&self, conn: &C, id: i64) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = bounded(
            "users.delete",
            self.timeout,
            User::delete_by_id(id).exec(conn),
        )
        .await?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            is_active: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user(1, "testuser");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.id, 1);
        assert_eq!(found.username, "testuser");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id(42).await;

        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "42"),
            other => panic!("expected UserNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let user = create_test_user(3, "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_email("alice@example.com").await.unwrap();

        assert_eq!(found.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_insert_returns_created_row() {
        let user = create_test_user(7, "bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(Arc::clone(&db));
        let model = user::ActiveModel {
            username: Set("bob".to_string()),
            email: Set("bob@example.com".to_string()),
            password_hash: Set(user.password_hash.clone()),
            is_active: Set(false),
            created_at: Set(user.created_at),
            ..Default::default()
        };
        let created = repo.insert(db.as_ref(), model).await.unwrap();

        assert_eq!(created.id, 7);
        assert!(!created.is_active);
    }

    #[tokio::test]
    async fn test_activate_missing_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(Arc::clone(&db));
        let result = repo.activate(db.as_ref(), 99).await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_existing_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(Arc::clone(&db));
        assert!(repo.delete(db.as_ref(), 7).await.is_ok());
    }
}
