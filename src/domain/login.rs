//! Login records
//!
//! A login is a named credential set for one Gitea instance. Several logins
//! may point at the same server as long as their tokens differ.

use serde::{Deserialize, Serialize};
use url::Url;

use super::remote::{normalize_server_url, strip_port};

/// Stored credentials for one Gitea server
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Login {
    pub name: String,
    pub url: String,
    pub token: String,
    pub default: bool,
    pub ssh_host: String,
    /// Optional path to the private key used for git operations
    pub ssh_key: String,
    pub insecure: bool,
    /// Username on the server, resolved when the login was added
    pub user: String,
    /// Unix timestamp of creation
    pub created: i64,
    /// Fields written by other tea versions, preserved on save
    #[serde(flatten)]
    pub other: serde_yaml::Mapping,
}

impl Login {
    /// Creates a login with the given name, server URL and token
    pub fn new(name: impl Into<String>, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// Server URL in canonical form, falling back to the stored string when
    /// it cannot be normalized (hand-edited configs).
    pub fn base_url(&self) -> String {
        normalize_server_url(&self.url).unwrap_or_else(|_| self.url.trim_end_matches('/').to_string())
    }

    /// SSH host used to match ssh remotes: the explicit override, or the
    /// hostname of the server URL.
    pub fn ssh_host(&self) -> String {
        if !self.ssh_host.is_empty() {
            return self.ssh_host.clone();
        }
        Url::parse(&self.base_url())
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// SSH host with any `:port` suffix removed, lowercased for comparison
    pub fn ssh_hostname(&self) -> String {
        strip_port(&self.ssh_host()).to_ascii_lowercase()
    }

    /// Web URL of a repository on this login's server
    pub fn repo_web_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{}/{}", self.base_url(), owner, repo)
    }
}
