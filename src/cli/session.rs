//! Per-invocation state shared by all commands

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::output::Output;
use crate::context::{resolve, ContextOptions, LoginSource, Requirement, ResolvedContext};
use crate::storage::{Config, ConfigError, ConfigStore};

/// Context flags given on the command line
#[derive(Debug, Clone, Default)]
pub struct ContextFlags {
    pub login: Option<String>,
    pub repo: Option<String>,
    pub remote: Option<String>,
}

/// Config, flags and output helper for one command invocation
pub struct Session<'o> {
    store: ConfigStore,
    config: Config,
    flags: ContextFlags,
    cwd: PathBuf,
    output: &'o Output,
}

impl<'o> Session<'o> {
    /// Loads the config from `config_path`, or the per-user default location
    pub fn open(config_path: Option<PathBuf>, flags: ContextFlags, output: &'o Output) -> Result<Self> {
        let store = match config_path {
            Some(path) => ConfigStore::new(path),
            None => ConfigStore::open_default()?,
        };
        output.verbose_ctx("config", &format!("Using config file {}", store.path().display()));

        let config = store.load()?;
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;

        Ok(Self {
            store,
            config,
            flags,
            cwd,
            output,
        })
    }

    pub fn output(&self) -> &'o Output {
        self.output
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Applies `f` to the on-disk config under the config lock and keeps
    /// the result as this session's config
    pub fn update<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Config) -> Result<T, ConfigError>,
    {
        let (config, value) = self.store.update(f)?;
        self.config = config;
        Ok(value)
    }

    /// Resolves the context and checks it against the command's requirement
    pub fn context(&self, requirement: Requirement) -> Result<ResolvedContext> {
        let options = ContextOptions {
            repo: self.flags.repo.clone(),
            login: self.flags.login.clone(),
            remote: self.flags.remote.clone(),
            cwd: self.cwd.clone(),
        };
        let ctx = resolve(&self.config, &options)?;

        if ctx.login_source() == LoginSource::Default {
            self.output.note(&format!(
                "no gitea login detected, falling back to login '{}'",
                ctx.login().name
            ));
        }
        self.output.verbose_ctx(
            "context",
            &format!(
                "login={} source={} repo={}",
                ctx.login().name,
                ctx.login_source().as_str(),
                ctx.repo_slug()
            ),
        );

        requirement.ensure(&ctx)?;
        Ok(ctx)
    }
}
