//! tea - command line client for Gitea
//!
//! The core of the crate decides, for every command, which server login and
//! which `owner/repo` to act on. It reconciles command line flags, the
//! multi-login config file and the remotes of the local git repository.

pub mod api;
pub mod cli;
pub mod context;
pub mod domain;
pub mod git;
pub mod storage;

pub use context::{resolve, ContextOptions, Requirement, ResolvedContext};
pub use domain::Login;
pub use storage::{Config, ConfigStore};
