//! Core business logic for the social backend.

pub mod services;

pub use services::*;
