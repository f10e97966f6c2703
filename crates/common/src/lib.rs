//! Common utilities and shared types for the social backend.
//!
//! This crate provides foundational components used across all workspace crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: The error taxonomy via [`AppError`] and [`AppResult`]
//! - **Invitation tokens**: Single-use activation secrets via [`InvitationToken`]
//!
//! # Example
//!
//! ```no_run
//! use social_common::{AppResult, Config, InvitationToken};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let token = InvitationToken::generate();
//!     println!("{} -> {}", config.server.port, token.hash());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod token;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use token::{InvitationToken, hash_token};
