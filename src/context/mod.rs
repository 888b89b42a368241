//! Resolution of the login and repository a command acts on

mod matcher;
mod requirement;
mod resolver;
mod strategy;

use thiserror::Error;

use crate::git::GitError;
use crate::storage::ConfigError;

pub use matcher::{match_by_remote, parse_remote_urls};
pub use requirement::{Requirement, Unmet};
pub use resolver::{
    resolve, select_remote, ContextOptions, LoginSource, RemoteStrategy, ResolvedContext,
    TRUNK_BRANCHES,
};
pub use strategy::{first_success, Strategy};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Remote '{0}' is not present in this git repository")]
    RemoteNotFound(String),

    #[error("Login name '{0}' does not exist")]
    LoginNotFound(String),

    #[error(
        "No gitea login configured. To start using tea, first run `tea login add` and then run your command again."
    )]
    NoLoginConfigured,

    #[error(transparent)]
    RequirementUnmet(#[from] Unmet),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),
}
