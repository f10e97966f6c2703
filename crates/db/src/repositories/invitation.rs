//! Invitation repository (the invitation ledger).
//!
//! All operations run on a caller-supplied connection so they can share a
//! transaction with the identity store.

use std::time::Duration;

use crate::bounded::{DEFAULT_QUERY_TIMEOUT, bounded};
use crate::entities::{UserInvitation, user_invitation};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set};
use social_common::AppResult;

/// Invitation repository for database operations.
#[derive(Clone, Debug)]
pub struct InvitationRepository {
    timeout: Duration,
}

impl Default for InvitationRepository {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_TIMEOUT)
    }
}

impl InvitationRepository {
    /// Create a new invitation repository with the given deadline.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Store the hash of an invitation token for `user_id`.
    pub async fn insert<C>(
        &self,
        conn: &C,
        token_hash: &str,
        user_id: i64,
        expiry: DateTime<Utc>,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let invitation = user_invitation::ActiveModel {
            token_hash: Set(token_hash.to_string()),
            user_id: Set(user_id),
            expiry: Set(expiry.into()),
        };

        bounded(
            "user_invitations.insert",
            self.timeout,
            UserInvitation::insert(invitation).exec_without_returning(conn),
        )
        .await?;
        Ok(())
    }

    /// Owner of a non-expired invitation with this hash.
    ///
    /// The row is locked (`FOR UPDATE`) until `conn`'s transaction ends, so a
    /// concurrent caller waits and then no longer sees a purged invitation.
    pub async fn find_valid_user_id<C>(
        &self,
        conn: &C,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<i64>>
    where
        C: ConnectionTrait,
    {
        let invitation = bounded(
            "user_invitations.find_valid",
            self.timeout,
            UserInvitation::find_by_id(token_hash.to_string())
                .filter(user_invitation::Column::Expiry.gt(now))
                .lock_exclusive()
                .one(conn),
        )
        .await?;

        Ok(invitation.map(|i| i.user_id))
    }

    /// Remove every invitation of a user. Returns the number removed.
    pub async fn purge_for_user<C>(&self, conn: &C, user_id: i64) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = bounded(
            "user_invitations.purge",
            self.timeout,
            UserInvitation::delete_many()
                .filter(user_invitation::Column::UserId.eq(user_id))
                .exec(conn),
        )
        .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_valid_returns_owner() {
        let invitation = user_invitation::Model {
            token_hash: "ab".repeat(32),
            user_id: 12,
            expiry: (Utc::now() + ChronoDuration::hours(72)).into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[invitation]])
            .into_connection();

        let repo = InvitationRepository::default();
        let owner = repo
            .find_valid_user_id(&db, &"ab".repeat(32), Utc::now())
            .await
            .unwrap();

        assert_eq!(owner, Some(12));
    }

    #[tokio::test]
    async fn test_find_valid_locks_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user_invitation::Model>::new()])
            .into_connection();

        let repo = InvitationRepository::default();
        repo.find_valid_user_id(&db, "deadbeef", Utc::now())
            .await
            .unwrap();

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("FOR UPDATE"), "{log}");
        assert!(log.contains(r#"\"expiry\" >"#), "{log}");
    }

    #[tokio::test]
    async fn test_find_valid_missing_or_expired() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user_invitation::Model>::new()])
            .into_connection();

        let repo = InvitationRepository::default();
        let owner = repo
            .find_valid_user_id(&db, "deadbeef", Utc::now())
            .await
            .unwrap();

        assert_eq!(owner, None);
    }

    #[tokio::test]
    async fn test_purge_reports_removed_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();

        let repo = InvitationRepository::default();
        assert_eq!(repo.purge_for_user(&db, 12).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_invitation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = InvitationRepository::default();
        let expiry = Utc::now() + ChronoDuration::hours(72);
        assert!(repo.insert(&db, "cafe", 12, expiry).await.is_ok());
    }
}
