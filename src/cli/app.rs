//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::login_cmd::{self, LoginCommands};
use super::output::{Output, OutputFormat};
use super::repo_cmd;
use super::session::{ContextFlags, Session};

#[derive(Parser)]
#[command(name = "tea")]
#[command(author, version, about = "Command line tool to interact with Gitea")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Use a different Gitea login
    #[arg(long, short = 'l', global = true)]
    pub login: Option<String>,

    /// Override the local repository path or the owner/repo slug
    #[arg(long, short = 'r', global = true)]
    pub repo: Option<String>,

    /// Discover the Gitea login from this git remote
    #[arg(long, short = 'R', global = true)]
    pub remote: Option<String>,

    /// Config file to use instead of the per-user default
    #[arg(long, global = true, hide = true, env = "TEA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage Gitea logins (lists them by default)
    Login {
        #[command(subcommand)]
        command: Option<LoginCommands>,
    },

    /// Remove a Gitea login
    Logout {
        /// Login name
        name: String,
    },

    /// Show the current user
    Whoami,

    /// Show the resolved login and repository
    Context,

    /// Print the web URL of the repository
    Open,

    /// List git remotes and the logins they match
    Remotes,
}

/// Sets up the tracing subscriber on stderr. `RUST_LOG` takes precedence;
/// otherwise `--verbose` selects debug output for this crate.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "tea_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

/// Runs a parsed command line
pub fn run(cli: Cli, output: &Output) -> Result<()> {
    output.verbose("tea starting");

    let flags = ContextFlags {
        login: cli.login,
        repo: cli.repo,
        remote: cli.remote,
    };
    let mut session = Session::open(cli.config, flags, output)?;

    match cli.command {
        Commands::Login { command } => login_cmd::run(command, &mut session)?,
        Commands::Logout { name } => login_cmd::delete(&name, &mut session)?,
        Commands::Whoami => repo_cmd::whoami(&session)?,
        Commands::Context => repo_cmd::context(&session)?,
        Commands::Open => repo_cmd::open(&session)?,
        Commands::Remotes => repo_cmd::remotes(&session)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tea", "open", "-r", "o/r", "-l", "work", "-o", "json"]).unwrap();
        assert_eq!(cli.repo.as_deref(), Some("o/r"));
        assert_eq!(cli.login.as_deref(), Some("work"));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn login_without_subcommand_lists() {
        let cli = Cli::try_parse_from(["tea", "login"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { command: None }));
    }

    #[test]
    fn login_ls_alias() {
        let cli = Cli::try_parse_from(["tea", "login", "ls"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login {
                command: Some(LoginCommands::List)
            }
        ));
    }
}
