//! Account provisioning and activation.
//!
//! Registration creates an inactive user and an invitation in one
//! transaction, then hands the plaintext token to the notification sender.
//! Delivery happens outside the transaction, so a failed delivery is undone
//! by a compensating delete instead of a rollback.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use social_common::{AppError, AppResult, Config, InvitationToken, hash_token};
use social_db::{
    bounded::{DEFAULT_QUERY_TIMEOUT, bounded, deadline},
    entities::user,
    repositories::{InvitationRepository, UserRepository},
};
use validator::Validate;

use super::mailer::{MailTemplate, SharedNotificationSender, TemplateData};
use super::password::hash_password;

/// Where a provisioning run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    /// Input accepted, nothing written.
    Requested,
    /// User row written (uncommitted).
    Created,
    /// Invitation written and committed with the user.
    Invited,
    /// Notification handed to the sender.
    NotifiedPending,
    /// Token consumed, user active.
    Activated,
    /// Notification failed and the account was removed.
    RolledBack,
}

impl ProvisioningState {
    /// Forward-only transition table.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Created)
                | (Self::Created, Self::Invited)
                | (Self::Invited, Self::NotifiedPending)
                | (Self::NotifiedPending, Self::Activated | Self::RolledBack)
        )
    }

    fn advance(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::Internal(format!(
                "illegal provisioning transition {self:?} -> {next:?}"
            )))
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserInput {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 3, max = 72))]
    pub password: String,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedAccount {
    pub user: user::Model,
    /// Plaintext invitation token. Never stored.
    pub token: String,
    pub state: ProvisioningState,
}

/// Outcome of a successful activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivatedAccount {
    pub user_id: i64,
    pub state: ProvisioningState,
}

/// Knobs for provisioning.
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    /// Base URL of the frontend; activation links point under it.
    pub frontend_url: String,
    /// How long an invitation stays valid.
    pub invitation_expiry: Duration,
    /// Ask the sender not to deliver for real.
    pub sandbox: bool,
    /// Bound on each transactional unit of work.
    pub timeout: Duration,
}

impl ProvisioningSettings {
    /// Derive settings from application configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            frontend_url: config.frontend_url.clone(),
            invitation_expiry: config.mail.invitation_expiry(),
            sandbox: !config.is_production(),
            timeout: config.database.query_timeout(),
        }
    }
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            invitation_expiry: Duration::from_secs(72 * 3600),
            sandbox: true,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Account service: registration, activation, deletion.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    invitation_repo: InvitationRepository,
    mailer: SharedNotificationSender,
    settings: ProvisioningSettings,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        mailer: SharedNotificationSender,
        settings: ProvisioningSettings,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db)).with_timeout(settings.timeout);
        let invitation_repo = InvitationRepository::new(settings.timeout);
        Self {
            db,
            user_repo,
            invitation_repo,
            mailer,
            settings,
        }
    }

    /// Register a new, inactive account and send its invitation.
    ///
    /// If the invitation cannot be delivered the account is deleted again
    /// and [`AppError::DeliveryFailure`] is returned.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<ProvisionedAccount> {
        let state = ProvisioningState::Requested;
        input.validate()?;

        let password_hash = hash_password(&input.password)?;
        let token = InvitationToken::generate();
        let expiry = Utc::now()
            + chrono::Duration::from_std(self.settings.invitation_expiry)
                .map_err(|e| AppError::Config(format!("Invalid invitation expiry: {e}")))?;

        let model = user::ActiveModel {
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            is_active: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let (user, state) = deadline(
            "accounts.provision",
            self.settings.timeout,
            async {
                let txn = bounded("accounts.begin", self.settings.timeout, self.db.begin()).await?;

                let user = self.user_repo.insert(&txn, model).await?;
                let state = state.advance(ProvisioningState::Created)?;

                self.invitation_repo
                    .insert(&txn, &token.hash(), user.id, expiry)
                    .await?;
                bounded("accounts.commit", self.settings.timeout, txn.commit()).await?;
                let state = state.advance(ProvisioningState::Invited)?;

                Ok((user, state))
            },
        )
        .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Account created");

        let data = TemplateData {
            username: user.username.clone(),
            activation_url: format!(
                "{}/confirm/{}",
                self.settings.frontend_url.trim_end_matches('/'),
                token.plain()
            ),
        };
        let state = state.advance(ProvisioningState::NotifiedPending)?;

        match self
            .mailer
            .send(
                MailTemplate::UserInvitation,
                &user.username,
                &user.email,
                &data,
                self.settings.sandbox,
            )
            .await
        {
            Ok(status) => {
                tracing::info!(user_id = user.id, status, "Invitation sent");
                Ok(ProvisionedAccount {
                    user,
                    token: token.into_plain(),
                    state,
                })
            }
            Err(err) => {
                tracing::error!(user_id = user.id, error = %err, "Invitation delivery failed");
                if let Err(compensation) = self.delete_account(user.id).await {
                    tracing::error!(
                        user_id = user.id,
                        error = %compensation,
                        "Failed to remove account after delivery failure"
                    );
                }
                let state = state.advance(ProvisioningState::RolledBack)?;
                tracing::warn!(user_id = user.id, ?state, "Account provisioning rolled back");
                Err(AppError::DeliveryFailure(err.to_string()))
            }
        }
    }

    /// Consume an invitation token and activate its user.
    ///
    /// Unknown, expired and already used tokens are all [`AppError::NotFound`].
    pub async fn activate(&self, plain_token: &str) -> AppResult<ActivatedAccount> {
        let token_hash = hash_token(plain_token);

        let user_id = deadline("accounts.activate", self.settings.timeout, async {
            let txn = bounded("accounts.begin", self.settings.timeout, self.db.begin()).await?;

            let user_id = self
                .invitation_repo
                .find_valid_user_id(&txn, &token_hash, Utc::now())
                .await?
                .ok_or_else(|| AppError::NotFound("invitation".to_string()))?;

            self.user_repo.activate(&txn, user_id).await?;
            self.invitation_repo.purge_for_user(&txn, user_id).await?;
            bounded("accounts.commit", self.settings.timeout, txn.commit()).await?;

            Ok(user_id)
        })
        .await?;

        let state = ProvisioningState::NotifiedPending.advance(ProvisioningState::Activated)?;
        tracing::info!(user_id, "Account activated");
        Ok(ActivatedAccount { user_id, state })
    }

    /// Delete a user and all of its invitations in one unit of work.
    pub async fn delete_account(&self, user_id: i64) -> AppResult<()> {
        deadline("accounts.delete", self.settings.timeout, async {
            let txn = bounded("accounts.begin", self.settings.timeout, self.db.begin()).await?;

            self.invitation_repo.purge_for_user(&txn, user_id).await?;
            self.user_repo.delete(&txn, user_id).await?;
            bounded("accounts.commit", self.settings.timeout, txn.commit()).await?;
            Ok(())
        })
        .await?;

        tracing::info!(user_id, "Account deleted");
        Ok(())
    }
}
