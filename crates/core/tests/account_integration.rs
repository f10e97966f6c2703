//! Account provisioning against a real `PostgreSQL`.
//!
//! Run with:
//! ```bash
//! cargo test -p social-core --features postgres-tests --test account_integration
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "postgres-tests")]

use std::sync::Arc;

use async_trait::async_trait;
use social_common::{AppError, AppResult};
use social_core::{
    AccountService, LogMailer, MailTemplate, NotificationSender, ProvisioningSettings,
    RegisterUserInput, SharedNotificationSender, TemplateData,
};
use social_db::repositories::UserRepository;
use social_db::test_utils::TestDatabase;

/// Sender whose provider is always down.
struct UnreachableSender;

#[async_trait]
impl NotificationSender for UnreachableSender {
    async fn send(
        &self,
        _template: MailTemplate,
        _recipient_name: &str,
        _recipient_address: &str,
        _data: &TemplateData,
        _sandbox: bool,
    ) -> AppResult<u16> {
        Err(AppError::DeliveryFailure("connection refused".to_string()))
    }
}

fn input(username: &str, email: &str) -> RegisterUserInput {
    RegisterUserInput {
        username: username.to_string(),
        email: email.to_string(),
        password: "s3cret".to_string(),
    }
}

fn accounts(db: &TestDatabase, mailer: SharedNotificationSender) -> AccountService {
    AccountService::new(db.connection(), mailer, ProvisioningSettings::default())
}

#[tokio::test]
async fn test_activate_twice_second_is_not_found() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let service = accounts(&db, Arc::new(LogMailer));

    let account = service
        .register(input("alice", "alice@example.com"))
        .await
        .unwrap();

    let first = service.activate(&account.token).await.unwrap();
    assert_eq!(first.user_id, account.user.id);
    let second = service.activate(&account.token).await;
    assert!(matches!(second, Err(AppError::NotFound(_))));

    let users = UserRepository::new(db.connection());
    assert!(users.get_by_id(account.user.id).await.unwrap().is_active);

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_activation_consumes_token_once() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let service = accounts(&db, Arc::new(LogMailer));

    let account = service
        .register(input("bob", "bob@example.com"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        service.activate(&account.token),
        service.activate(&account.token)
    );
    let outcomes = [a, b];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::NotFound(_))))
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_failed_delivery_leaves_no_user() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let service = accounts(&db, Arc::new(UnreachableSender));

    let result = service
        .register(input("carol", "carol@example.com"))
        .await;
    assert!(matches!(result, Err(AppError::DeliveryFailure(_))));

    let users = UserRepository::new(db.connection());
    assert!(users.find_by_username("carol").await.unwrap().is_none());
    assert!(
        users
            .find_by_email("carol@example.com")
            .await
            .unwrap()
            .is_none()
    );

    // The name and address are free again
    let retry = accounts(&db, Arc::new(LogMailer))
        .register(input("carol", "carol@example.com"))
        .await;
    assert!(retry.is_ok());

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_duplicates_are_distinguished() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let service = accounts(&db, Arc::new(LogMailer));

    service
        .register(input("dave", "dave@example.com"))
        .await
        .unwrap();

    let same_name = service
        .register(input("dave", "other@example.com"))
        .await;
    assert!(matches!(same_name, Err(AppError::DuplicateUsername)));

    let same_email = service
        .register(input("david", "dave@example.com"))
        .await;
    assert!(matches!(same_email, Err(AppError::DuplicateEmail)));

    let users = UserRepository::new(db.connection());
    assert!(users.find_by_username("david").await.unwrap().is_none());

    db.drop_database().await.unwrap();
}
