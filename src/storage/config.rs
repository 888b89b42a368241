//! Configuration handling for tea
//!
//! Logins and preferences are stored in `~/.config/tea/config.yml`
//! (or wherever `TEA_CONFIG` points). The file is always read and written as
//! a whole.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{normalize_server_url, Login, UrlError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Login name '{0}' has already been used")]
    DuplicateName(String),

    #[error("Token already used by login '{0}', delete that login first")]
    DuplicateCredential(String),

    #[error("Login '{0}' does not exist")]
    NotFound(String),

    #[error("No available login")]
    NoLoginConfigured,

    #[error(transparent)]
    Url(#[from] UrlError),
}

/// Defaults applied to flags that were not given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagDefaults {
    /// Remote used for login detection when `--remote` is absent
    pub remote: String,
}

/// User preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub flag_defaults: FlagDefaults,

    /// Preferences this client does not act on, kept so saving does not
    /// drop them
    #[serde(flatten)]
    pub other: serde_yaml::Mapping,
}

/// Contents of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logins: Vec<Login>,
    pub preferences: Preferences,
}

impl Config {
    /// Returns the first login with the given name
    pub fn get_by_name(&self, name: &str) -> Option<&Login> {
        self.logins.iter().find(|l| l.name == name)
    }

    /// Returns the first login using the given token
    pub fn get_by_token(&self, token: &str) -> Option<&Login> {
        if token.is_empty() {
            return None;
        }
        self.logins.iter().find(|l| l.token == token)
    }

    /// Returns the login flagged as default, or the first login
    pub fn get_default(&self) -> Result<&Login, ConfigError> {
        self.logins
            .iter()
            .find(|l| l.default)
            .or_else(|| self.logins.first())
            .ok_or(ConfigError::NoLoginConfigured)
    }

    /// Adds a login after checking name and credential uniqueness.
    ///
    /// The list is left untouched when an error is returned.
    pub fn add(&mut self, mut login: Login) -> Result<(), ConfigError> {
        let url = normalize_server_url(&login.url)?;

        for existing in &self.logins {
            if existing.name.eq_ignore_ascii_case(&login.name) {
                return Err(ConfigError::DuplicateName(existing.name.clone()));
            }
            if existing.base_url() == url && existing.token == login.token {
                return Err(ConfigError::DuplicateCredential(existing.name.clone()));
            }
        }

        login.url = url;
        if login.ssh_host.is_empty() {
            login.ssh_host = login.ssh_host();
        }
        if login.default {
            for existing in &mut self.logins {
                existing.default = false;
            }
        }

        debug!(name = %login.name, url = %login.url, "adding login");
        self.logins.push(login);
        Ok(())
    }

    /// Removes the login with the given name
    pub fn delete(&mut self, name: &str) -> Result<Login, ConfigError> {
        let idx = self
            .logins
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        Ok(self.logins.remove(idx))
    }

    /// Flags the named login as default and clears the flag everywhere else
    pub fn set_default(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.get_by_name(name).is_none() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        for login in &mut self.logins {
            login.default = login.name == name;
        }
        Ok(())
    }

    /// Generates a login name from the server host, appending the username
    /// when the host alone is already taken.
    pub fn generate_login_name(&self, url: &str, user: &str) -> Result<String, ConfigError> {
        let normalized = normalize_server_url(url)?;
        let name = url::Url::parse(&normalized)
            .ok()
            .and_then(|u| {
                u.host_str().map(|host| match u.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                })
            })
            .unwrap_or(normalized);

        if !user.is_empty() && self.get_by_name(&name).is_some() {
            return Ok(format!("{}_{}", name, user));
        }
        Ok(name)
    }
}

/// Exclusive lock on the config file, held until dropped
pub struct ConfigLock {
    file: File,
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Reads and writes the config file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the per-user default location
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::default_path()
            .map(Self::new)
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the per-user config file path
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "gitea", "tea").map(|dirs| dirs.config_dir().join("config.yml"))
    }

    /// Returns the path to the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration. A missing file yields an empty config.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "config file absent, starting empty");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Writes the full configuration, replacing the previous file atomically
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let lock = self.lock()?;
        self.write(config, &lock)
    }

    /// Reloads the config, applies `f` and saves the result, holding the
    /// config lock across the whole read-modify-write.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T, F>(&self, f: F) -> Result<(Config, T), ConfigError>
    where
        F: FnOnce(&mut Config) -> Result<T, ConfigError>,
    {
        let lock = self.lock()?;
        let mut config = self.load()?;
        let value = f(&mut config)?;
        self.write(&config, &lock)?;
        Ok((config, value))
    }

    /// Takes the exclusive lock on `<config>.lock`, released on drop
    pub fn lock(&self) -> Result<ConfigLock, ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let path = self.sidecar_path("lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| self.io_error(&path, e))?;
        file.lock_exclusive().map_err(|e| self.io_error(&path, e))?;

        Ok(ConfigLock { file })
    }

    // Only called with the lock held, so the fixed temp name cannot collide
    fn write(&self, config: &Config, _lock: &ConfigLock) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        // Write to temp file first
        let temp_path = self.sidecar_path("tmp");
        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| self.io_error(&temp_path, e))?;

            let mut writer = BufWriter::new(&file);
            writer
                .write_all(content.as_bytes())
                .and_then(|_| writer.flush())
                .map_err(|e| self.io_error(&temp_path, e))?;
            drop(writer);

            file.sync_all()
                .map_err(|e| self.io_error(&temp_path, e))?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        debug!(path = %self.path.display(), logins = config.logins.len(), "saved config");
        Ok(())
    }

    fn sidecar_path(&self, extension: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "config.yml".into());
        name.push(".");
        name.push(extension);
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: io::Error) -> ConfigError {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn login(name: &str, url: &str, token: &str) -> Login {
        Login::new(name, url, token)
    }

    fn sample_config() -> Config {
        let mut config = Config::default();
        config.add(login("work", "https://gitea.work.com", "t1")).unwrap();
        config.add(login("home", "https://gitea.home.net", "t2")).unwrap();
        config
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nope").join("config.yml"));

        let config = store.load().unwrap();
        assert!(config.logins.is_empty());
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "logins: [this is: not: valid").unwrap();

        let err = ConfigStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("tea").join("config.yml"));

        let mut config = sample_config();
        config.logins[1].user = "alice".to_string();
        config.logins[1].insecure = true;
        config.preferences.flag_defaults.remote = "upstream".to_string();
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, config);

        // Saving the unmodified list again keeps the same content
        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), config);
        assert!(!store.sidecar_path("tmp").exists());
    }

    #[test]
    fn parses_original_layout() {
        let yaml = r#"
logins:
- name: gitea.com
  url: https://gitea.com
  token: abc
  default: true
  ssh_host: gitea.com
  ssh_key: ""
  insecure: false
  user: alice
  created: 1700000000
preferences:
  editor: false
  flag_defaults:
    remote: origin
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.logins.len(), 1);
        assert!(config.logins[0].default);
        assert_eq!(config.logins[0].user, "alice");
        assert_eq!(config.preferences.flag_defaults.remote, "origin");
        assert!(config.preferences.other.contains_key("editor"));
    }

    #[test]
    fn unknown_fields_survive_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "logins:\n- name: work\n  url: https://gitea.work.com\n  token: t\n  ssh_agent: true\n  version_check: false\npreferences:\n  editor: true\n",
        )
        .unwrap();
        let store = ConfigStore::new(&path);

        let config = store.load().unwrap();
        store.save(&config).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("ssh_agent: true"));
        assert!(written.contains("version_check: false"));
        assert!(written.contains("editor: true"));
    }

    #[test]
    fn update_persists_changes() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yml"));
        store.save(&sample_config()).unwrap();

        let (config, removed) = store.update(|config| config.delete("work")).unwrap();
        assert_eq!(removed.name, "work");
        assert_eq!(config.logins.len(), 1);
        assert_eq!(store.load().unwrap(), config);
        assert!(dir.path().join("config.yml.lock").exists());
    }

    #[test]
    fn failed_update_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yml"));
        store.save(&sample_config()).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.update(|config| config.delete("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = ConfigStore::new(&path);
                std::thread::spawn(move || {
                    store
                        .update(|config| {
                            config.add(login(
                                &format!("l{}", i),
                                "https://x.example.com",
                                &format!("t{}", i),
                            ))
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let config = ConfigStore::new(&path).load().unwrap();
        assert_eq!(config.logins.len(), 8);
    }

    #[test]
    fn get_by_name_finds_entry() {
        let config = sample_config();
        assert_eq!(config.get_by_name("home").unwrap().url, "https://gitea.home.net");
        assert!(config.get_by_name("missing").is_none());
    }

    #[test]
    fn get_default_prefers_flagged_login() {
        let mut config = sample_config();
        assert_eq!(config.get_default().unwrap().name, "work");

        config.set_default("home").unwrap();
        assert_eq!(config.get_default().unwrap().name, "home");
        assert_eq!(config.logins.iter().filter(|l| l.default).count(), 1);
    }

    #[test]
    fn get_default_on_empty_list_fails() {
        let config = Config::default();
        assert!(matches!(
            config.get_default(),
            Err(ConfigError::NoLoginConfigured)
        ));
    }

    #[test]
    fn add_rejects_duplicate_name() {
        let mut config = sample_config();
        let err = config
            .add(login("WORK", "https://other.example.com", "t9"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(_)));
        assert_eq!(config.logins.len(), 2);
    }

    #[test]
    fn add_rejects_duplicate_credential() {
        let mut config = sample_config();
        let before = config.clone();

        let err = config
            .add(login("again", "gitea.work.com/", "t1"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCredential(name) if name == "work"));
        assert_eq!(config, before);
    }

    #[test]
    fn add_allows_same_server_with_other_token() {
        let mut config = sample_config();
        config
            .add(login("work-bot", "https://gitea.work.com", "t3"))
            .unwrap();
        assert_eq!(config.logins.len(), 3);
    }

    #[test]
    fn add_normalizes_url_and_fills_ssh_host() {
        let mut config = Config::default();
        config.add(login("a", "gitea.example.com/", "t")).unwrap();

        let added = &config.logins[0];
        assert_eq!(added.url, "https://gitea.example.com");
        assert_eq!(added.ssh_host, "gitea.example.com");
    }

    #[test]
    fn add_default_clears_other_defaults() {
        let mut config = sample_config();
        config.set_default("work").unwrap();

        let mut new = login("new", "https://new.example.com", "t4");
        new.default = true;
        config.add(new).unwrap();

        let defaults: Vec<_> = config.logins.iter().filter(|l| l.default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].name, "new");
    }

    #[test]
    fn delete_removes_login() {
        let mut config = sample_config();
        let removed = config.delete("work").unwrap();
        assert_eq!(removed.name, "work");
        assert_eq!(config.logins.len(), 1);

        assert!(matches!(
            config.delete("work"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn set_default_unknown_login() {
        let mut config = sample_config();
        assert!(matches!(
            config.set_default("nope"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn generated_name_uses_host_then_user() {
        let mut config = Config::default();
        assert_eq!(
            config.generate_login_name("gitea.example.com", "alice").unwrap(),
            "gitea.example.com"
        );

        config
            .add(login("gitea.example.com", "https://gitea.example.com", "t"))
            .unwrap();
        assert_eq!(
            config.generate_login_name("https://gitea.example.com/", "alice").unwrap(),
            "gitea.example.com_alice"
        );
    }

    proptest! {
        #[test]
        fn get_by_name_returns_unique_match(names in proptest::collection::hash_set("[a-z]{1,8}", 1..8)) {
            let mut config = Config::default();
            for (i, name) in names.iter().enumerate() {
                config.logins.push(login(name, "https://x.example.com", &format!("t{}", i)));
            }
            for name in &names {
                let found = config.get_by_name(name).unwrap();
                prop_assert_eq!(&found.name, name);
            }
            prop_assert!(config.get_by_name("NOT-A-NAME").is_none());
        }

        #[test]
        fn get_default_is_deterministic(count in 1usize..8, flagged in proptest::option::of(0usize..8)) {
            let mut config = Config::default();
            for i in 0..count {
                let mut l = login(&format!("l{}", i), "https://x.example.com", &format!("t{}", i));
                l.default = flagged == Some(i);
                config.logins.push(l);
            }
            let first = config.get_default().unwrap().name.clone();
            let second = config.get_default().unwrap().name.clone();
            prop_assert_eq!(&first, &second);

            let expected = match flagged {
                Some(i) if i < count => format!("l{}", i),
                _ => "l0".to_string(),
            };
            prop_assert_eq!(first, expected);
        }
    }
}
