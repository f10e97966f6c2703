//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod feed;
pub mod following;
pub mod mailer;
pub mod password;
pub mod post;
pub mod seed;
pub mod user;

pub use account::{
    AccountService, ActivatedAccount, ProvisionedAccount, ProvisioningSettings,
    ProvisioningState, RegisterUserInput,
};
pub use feed::{FeedParams, FeedQuery, FeedService, MAX_FEED_LIMIT, MAX_FEED_OFFSET};
pub use following::FollowingService;
pub use mailer::{
    LogMailer, MailTemplate, NotificationSender, RenderedMail, SendGridMailer,
    SharedNotificationSender, SmtpMailer, TemplateData, sender_from_config,
};
pub use password::hash_password;
pub use post::{
    CreateCommentInput, CreatePostInput, DEFAULT_UPDATE_ATTEMPTS, PostService, PostWithComments,
    UpdatePostInput, normalize_tags,
};
pub use seed::{SeedOptions, SeedPlan, SeedReport, seed};
pub use user::{UserProfile, UserService};
