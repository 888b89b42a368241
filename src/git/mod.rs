//! Local git access
//!
//! Thin wrapper over libgit2 exposing what context resolution needs.

mod repo;

pub use repo::{BranchTracking, GitError, LocalRepo, Remote, RepoSnapshot};
