//! Gitea HTTP API access
//!
//! Only the calls needed for login management are implemented.

mod client;

pub use client::{AccessToken, ApiError, CreateAccessToken, GiteaClient, User};
