//! Local git repository access using libgit2
//!
//! Only repository metadata is read: remotes and branch tracking entries from
//! `.git/config`, plus the checked out branch.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use git2::{Config, ConfigLevel, ErrorCode, Repository};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

/// A configured remote and its URLs, in config order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub urls: Vec<String>,
}

/// Upstream configuration of a local branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTracking {
    pub remote: Option<String>,
    pub merge: Option<String>,
}

/// Remotes and branch tracking entries read from a repository's config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub remotes: Vec<Remote>,
    pub branches: BTreeMap<String, BranchTracking>,
}

impl RepoSnapshot {
    /// Returns the remote with the given name
    pub fn remote(&self, name: &str) -> Option<&Remote> {
        self.remotes.iter().find(|r| r.name == name)
    }

    /// Adds a URL to a remote, creating the remote on first sight
    pub fn push_remote_url(&mut self, name: &str, url: &str) {
        match self.remotes.iter_mut().find(|r| r.name == name) {
            Some(remote) => remote.urls.push(url.to_string()),
            None => self.remotes.push(Remote {
                name: name.to_string(),
                urls: vec![url.to_string()],
            }),
        }
    }
}

/// An opened local repository
pub struct LocalRepo {
    repo: Repository,
}

impl fmt::Debug for LocalRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalRepo")
            .field("path", &self.path())
            .finish()
    }
}

impl LocalRepo {
    /// Opens the repository containing `path`, searching parent directories
    pub fn open(path: &Path) -> Result<Self, GitError> {
        match Repository::discover(path) {
            Ok(repo) => {
                debug!("Opened git repository at {:?}", repo.path());
                Ok(Self { repo })
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                Err(GitError::NotARepository(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the working directory, or the git dir for bare repositories
    pub fn path(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// Reads remotes and branch tracking entries
    pub fn snapshot(&self) -> Result<RepoSnapshot, GitError> {
        let config = self.local_config()?;
        let mut snapshot = RepoSnapshot::default();

        let mut entries = config.entries(Some(r"^(remote\..+\.url|branch\..+\.(remote|merge))$"))?;
        while let Some(entry) = entries.next() {
            let entry = entry?;
            let (Some(key), Some(value)) = (entry.name(), entry.value()) else {
                continue;
            };

            if let Some(name) = key.strip_prefix("remote.").and_then(|k| k.strip_suffix(".url")) {
                snapshot.push_remote_url(name, value);
            } else if let Some(rest) = key.strip_prefix("branch.") {
                if let Some(name) = rest.strip_suffix(".remote") {
                    let tracking = snapshot.branches.entry(name.to_string()).or_default();
                    tracking.remote = Some(value.to_string());
                } else if let Some(name) = rest.strip_suffix(".merge") {
                    let tracking = snapshot.branches.entry(name.to_string()).or_default();
                    tracking.merge = Some(value.to_string());
                }
            }
        }

        debug!(
            remotes = snapshot.remotes.len(),
            branches = snapshot.branches.len(),
            "read repository config"
        );
        Ok(snapshot)
    }

    /// Configured remotes with their URLs
    pub fn remotes(&self) -> Result<Vec<Remote>, GitError> {
        Ok(self.snapshot()?.remotes)
    }

    /// Branch tracking configuration keyed by branch name
    pub fn branches(&self) -> Result<BTreeMap<String, BranchTracking>, GitError> {
        Ok(self.snapshot()?.branches)
    }

    /// Short name of the checked out branch, if HEAD points at one
    pub fn head_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(str::to_string)
    }

    fn local_config(&self) -> Result<Config, GitError> {
        Ok(self.repo.config()?.open_level(ConfigLevel::Local)?)
    }
}
