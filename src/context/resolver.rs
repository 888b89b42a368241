//! Context resolution
//!
//! Decides which login and which `owner/repo` a command acts on. Signals are
//! consulted in a fixed order:
//!
//! 1. `--repo` naming an existing directory selects the repository to
//!    inspect, otherwise the working directory is inspected
//! 2. the git repository found there (if any) provides remotes
//! 3. one remote is selected (see [`RemoteStrategy`])
//! 4. its URLs are matched against the configured logins
//! 5. `--repo` that is not a directory overrides the slug
//! 6. the login comes from `--login`, the remote match, or the default login
//! 7. the slug is split into owner and repo

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::matcher::{match_by_remote, parse_remote_urls};
use super::strategy::{first_success, Strategy};
use super::ContextError;
use crate::domain::{split_owner_repo, Login};
use crate::git::{GitError, LocalRepo, RepoSnapshot};
use crate::storage::Config;

/// Branches whose upstream decides the remote, in priority order
pub const TRUNK_BRANCHES: [&str; 3] = ["main", "master", "trunk"];

/// Overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Local path or `owner/repo` slug
    pub repo: Option<String>,
    /// Login name
    pub login: Option<String>,
    /// Git remote name
    pub remote: Option<String>,
    /// Directory to inspect when `repo` is not a path
    pub cwd: PathBuf,
}

impl ContextOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = Some(remote.into());
        self
    }
}

/// Where the resolved login came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSource {
    /// Named with `--login`
    Flag,
    /// Matched against a git remote
    Remote,
    /// Fallback to the default login
    Default,
}

impl LoginSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginSource::Flag => "flag",
            LoginSource::Remote => "remote",
            LoginSource::Default => "default",
        }
    }
}

/// The login and repository a command operates on
#[derive(Debug)]
pub struct ResolvedContext {
    login: Login,
    login_source: LoginSource,
    repo_slug: String,
    owner: String,
    repo: String,
    remote: Option<String>,
    local_repo: Option<LocalRepo>,
}

impl ResolvedContext {
    pub(crate) fn from_parts(
        login: Login,
        login_source: LoginSource,
        repo_slug: String,
        remote: Option<String>,
        local_repo: Option<LocalRepo>,
    ) -> Self {
        let (owner, repo) = split_owner_repo(&repo_slug, &login.user);
        Self {
            login,
            login_source,
            repo_slug,
            owner,
            repo,
            remote,
            local_repo,
        }
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    pub fn login_source(&self) -> LoginSource {
        self.login_source
    }

    /// `owner/repo` as given or detected; may be empty
    pub fn repo_slug(&self) -> &str {
        &self.repo_slug
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Name of the git remote used for login detection
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    pub fn local_repo(&self) -> Option<&LocalRepo> {
        self.local_repo.as_ref()
    }

    /// Web URL of the repository on the login's server
    pub fn repo_web_url(&self) -> String {
        self.login.repo_web_url(&self.owner, &self.repo)
    }
}

/// Ways of picking the remote used for login detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStrategy {
    /// Remote named with `--remote`; fails when it does not exist
    Explicit(String),
    /// Remote named in the preferences; skipped when it does not exist
    Preferred(String),
    /// The only configured remote
    OnlyRemote,
    /// Upstream of the first existing trunk branch
    TrunkBranch,
    /// A remote with a conventional name
    Named(&'static str),
    /// First remote in config order
    FirstRemote,
}

impl RemoteStrategy {
    /// The strategy chain for an optional `--remote` flag and an optional
    /// preferred remote from the config
    pub fn chain(explicit: Option<&str>, preferred: Option<&str>) -> Vec<RemoteStrategy> {
        let mut chain = Vec::with_capacity(7);
        if let Some(name) = explicit {
            chain.push(RemoteStrategy::Explicit(name.to_string()));
        }
        if let Some(name) = preferred {
            chain.push(RemoteStrategy::Preferred(name.to_string()));
        }
        chain.extend([
            RemoteStrategy::OnlyRemote,
            RemoteStrategy::TrunkBranch,
            RemoteStrategy::Named("upstream"),
            RemoteStrategy::Named("origin"),
            RemoteStrategy::FirstRemote,
        ]);
        chain
    }
}

impl Strategy<RepoSnapshot> for RemoteStrategy {
    type Output = String;
    type Error = ContextError;

    fn attempt(&self, snapshot: &RepoSnapshot) -> Result<Option<String>, ContextError> {
        let existing = |name: &str| snapshot.remote(name).map(|r| r.name.clone());

        Ok(match self {
            RemoteStrategy::Explicit(name) => {
                Some(
                    existing(name.as_str())
                        .ok_or_else(|| ContextError::RemoteNotFound(name.clone()))?,
                )
            }
            RemoteStrategy::Preferred(name) => {
                let found = existing(name.as_str());
                if found.is_none() {
                    debug!(remote = %name, "Preferred remote not present, ignoring");
                }
                found
            }
            RemoteStrategy::OnlyRemote => match snapshot.remotes.as_slice() {
                [only] => Some(only.name.clone()),
                _ => None,
            },
            RemoteStrategy::TrunkBranch => TRUNK_BRANCHES
                .iter()
                .find_map(|b| snapshot.branches.get(*b))
                .and_then(|tracking| tracking.remote.as_deref())
                .and_then(existing),
            RemoteStrategy::Named(name) => existing(*name),
            RemoteStrategy::FirstRemote => snapshot.remotes.first().map(|r| r.name.clone()),
        })
    }
}

/// Ways of picking the login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStrategy<'a> {
    Explicit(&'a str),
    Matched,
    Default,
}

struct LoginInput<'a> {
    config: &'a Config,
    matched: Option<&'a Login>,
}

impl Strategy<LoginInput<'_>> for LoginStrategy<'_> {
    type Output = Login;
    type Error = ContextError;

    fn attempt(&self, input: &LoginInput<'_>) -> Result<Option<Login>, ContextError> {
        match self {
            LoginStrategy::Explicit(name) => input
                .config
                .get_by_name(name)
                .cloned()
                .map(Some)
                .ok_or_else(|| ContextError::LoginNotFound(name.to_string())),
            LoginStrategy::Matched => Ok(input.matched.cloned()),
            LoginStrategy::Default => Ok(input.config.get_default().ok().cloned()),
        }
    }
}

impl LoginStrategy<'_> {
    fn source(&self) -> LoginSource {
        match self {
            LoginStrategy::Explicit(_) => LoginSource::Flag,
            LoginStrategy::Matched => LoginSource::Remote,
            LoginStrategy::Default => LoginSource::Default,
        }
    }
}

/// Picks the remote used for login detection.
///
/// `explicit` comes from `--remote` and must name an existing remote, even
/// when the repository has none. `preferred` comes from the config and is
/// dropped quietly when absent. Returns `None` when nothing can be selected.
pub fn select_remote(
    snapshot: &RepoSnapshot,
    explicit: Option<&str>,
    preferred: Option<&str>,
) -> Result<Option<String>, ContextError> {
    if snapshot.remotes.is_empty() {
        debug!("Repository has no remotes configured");
    }

    let chain = RemoteStrategy::chain(explicit, preferred);
    let selected = first_success(&chain, snapshot)?;
    if let Some((strategy, name)) = &selected {
        debug!(remote = %name, ?strategy, "selected remote");
    }
    Ok(selected.map(|(_, name)| name))
}

/// Resolves the login and repository for one command invocation
pub fn resolve(config: &Config, options: &ContextOptions) -> Result<ResolvedContext, ContextError> {
    let repo_flag = non_empty(options.repo.as_deref());
    let login_flag = non_empty(options.login.as_deref());
    let remote_flag = non_empty(options.remote.as_deref());
    let remote_pref = non_empty(Some(config.preferences.flag_defaults.remote.as_str()));

    // 1. a --repo value naming a directory selects the repository to inspect
    let repo_dir = repo_flag
        .map(|r| absolute(&options.cwd, r))
        .filter(|p| p.is_dir());
    let inspect_at = repo_dir.as_deref().unwrap_or(&options.cwd);

    // 2. open the local repository; not finding one is fine
    let local_repo = match LocalRepo::open(inspect_at) {
        Ok(repo) => Some(repo),
        Err(GitError::NotARepository(path)) => {
            debug!("No git repository at {:?}", path);
            None
        }
        Err(e) => return Err(e.into()),
    };

    // 3 + 4. select a remote and match it against the logins
    let mut remote = None;
    let mut matched = None;
    if let Some(repo) = &local_repo {
        let snapshot = repo.snapshot()?;
        remote = select_remote(&snapshot, remote_flag, remote_pref)?;
        if let Some(selected) = remote.as_deref().and_then(|name| snapshot.remote(name)) {
            let urls = parse_remote_urls(&selected.urls);
            if urls.is_empty() {
                warn!(remote = %selected.name, "Remote has no usable URL, skipping login detection");
            }
            matched = match_by_remote(&urls, &config.logins);
            if matched.is_none() {
                debug!(remote = %selected.name, "No login matches the remote");
            }
        }
    }

    // 5. a --repo value that is not a directory is a slug
    let repo_slug = match (repo_flag, &repo_dir) {
        (Some(slug), None) => slug.to_string(),
        _ => matched
            .as_ref()
            .map(|(_, slug)| slug.clone())
            .unwrap_or_default(),
    };

    // 6. pick the login
    let mut chain = Vec::with_capacity(3);
    if let Some(name) = login_flag {
        chain.push(LoginStrategy::Explicit(name));
    }
    chain.extend([LoginStrategy::Matched, LoginStrategy::Default]);

    let input = LoginInput {
        config,
        matched: matched.as_ref().map(|(login, _)| login),
    };
    let (strategy, login) =
        first_success(&chain, &input)?.ok_or(ContextError::NoLoginConfigured)?;
    debug!(login = %login.name, source = strategy.source().as_str(), "resolved login");

    // 7. owner/repo split happens in from_parts
    Ok(ResolvedContext::from_parts(
        login,
        strategy.source(),
        repo_slug,
        remote,
        local_repo,
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn absolute(cwd: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
