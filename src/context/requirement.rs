//! Per-command context requirements

use thiserror::Error;

use super::ResolvedContext;

/// A requirement a command places on the resolved context
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Unmet {
    #[error("Local repository required: Execute from a repo dir, or specify a path with --repo.")]
    LocalRepo,

    #[error("Remote repository required: Specify ID via --repo or execute from a local git repo.")]
    RemoteRepo,
}

/// What a command needs from its context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirement {
    /// A local git repository must have been found
    pub local_repo: bool,
    /// An `owner/repo` slug must be known
    pub remote_repo: bool,
}

impl Requirement {
    /// No requirement
    pub const NONE: Requirement = Requirement {
        local_repo: false,
        remote_repo: false,
    };

    /// A local repository, which also implies a known remote repository
    pub const LOCAL_REPO: Requirement = Requirement {
        local_repo: true,
        remote_repo: true,
    };

    /// A local clone, whatever its remotes point at. For commands that
    /// inspect the clone itself rather than a repository on the server.
    pub const LOCAL_CHECKOUT: Requirement = Requirement {
        local_repo: true,
        remote_repo: false,
    };

    /// A remote repository, given by slug or detected from a local clone
    pub const REMOTE_REPO: Requirement = Requirement {
        local_repo: false,
        remote_repo: true,
    };

    /// Checks the context, local repository first
    pub fn ensure(&self, ctx: &ResolvedContext) -> Result<(), Unmet> {
        if self.local_repo && ctx.local_repo().is_none() {
            return Err(Unmet::LocalRepo);
        }
        if self.remote_repo && ctx.repo_slug().is_empty() {
            return Err(Unmet::RemoteRepo);
        }
        Ok(())
    }
}
