//! Login management commands

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};

use super::output::Output;
use super::session::Session;
use crate::api::{AccessToken, CreateAccessToken, GiteaClient, User};
use crate::domain::{normalize_server_url, Login};
use crate::storage::Config;

#[derive(Subcommand)]
pub enum LoginCommands {
    /// List configured logins
    #[command(visible_alias = "ls")]
    List,

    /// Add a Gitea login
    Add(AddArgs),

    /// Get or set the default login
    Default {
        /// Login to make the default
        name: Option<String>,
    },

    /// Remove a login
    #[command(visible_alias = "rm")]
    Delete {
        /// Login name
        name: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Login name, derived from the server host when omitted
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Server URL
    #[arg(long, short = 'u', env = "GITEA_SERVER_URL")]
    pub url: String,

    /// Access token, obtained from Settings > Applications
    #[arg(long, short = 't', env = "GITEA_SERVER_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Username; with --password a new access token is created for it
    #[arg(long, env = "GITEA_SERVER_USER")]
    pub user: Option<String>,

    /// Password used once to create an access token
    #[arg(long, visible_alias = "pwd", env = "GITEA_SERVER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// One-time password for accounts with two-factor authentication
    #[arg(long, env = "GITEA_SERVER_OTP")]
    pub otp: Option<String>,

    /// Comma separated scopes for the created token
    #[arg(long, default_value = "")]
    pub scopes: String,

    /// Path to an SSH key to use, overrides auto-discovery
    #[arg(long, short = 's')]
    pub ssh_key: Option<String>,

    /// Disable TLS verification
    #[arg(long, short = 'i')]
    pub insecure: bool,

    /// Do not contact the server to verify the token
    #[arg(long)]
    pub no_verify: bool,

    /// Make this the default login
    #[arg(long)]
    pub default: bool,
}

/// Username and password used to create an access token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub otp: Option<String>,
    pub scopes: Vec<String>,
}

/// The server calls `login add` makes
pub trait LoginServer {
    /// Returns the user owning the login's token
    fn user_info(&self, login: &Login) -> Result<User>;

    /// Creates an access token with basic auth and returns its secret
    fn create_token(&self, login: &Login, credentials: &Credentials) -> Result<String>;
}

/// `LoginServer` backed by the Gitea API
struct GiteaServer<'o> {
    output: &'o Output,
}

impl LoginServer for GiteaServer<'_> {
    fn user_info(&self, login: &Login) -> Result<User> {
        self.output
            .verbose_ctx("login", &format!("Verifying token against {}", login.url));
        Ok(GiteaClient::new(login).get_my_user_info()?)
    }

    fn create_token(&self, login: &Login, credentials: &Credentials) -> Result<String> {
        let client = GiteaClient::with_basic_auth(
            login,
            &credentials.user,
            &credentials.password,
            credentials.otp.as_deref(),
        );

        let existing = client.list_access_tokens(&credentials.user)?;
        let name = token_name(&local_hostname(), &existing, Local::now());
        self.output
            .verbose_ctx("login", &format!("Creating access token {}", name));

        let token = client.create_access_token(
            &credentials.user,
            &CreateAccessToken {
                name,
                scopes: credentials.scopes.clone(),
            },
        )?;
        Ok(token.sha1)
    }
}

pub fn run(cmd: Option<LoginCommands>, session: &mut Session<'_>) -> Result<()> {
    match cmd.unwrap_or(LoginCommands::List) {
        LoginCommands::List => list(session.config(), session.output()),
        LoginCommands::Add(args) => add(args, session),
        LoginCommands::Default { name } => default(name.as_deref(), session),
        LoginCommands::Delete { name } => delete(&name, session),
    }
}

/// Prints all logins
pub fn list(config: &Config, output: &Output) -> Result<()> {
    output.verbose_ctx("login", &format!("{} logins configured", config.logins.len()));

    let rows: Vec<Vec<String>> = config
        .logins
        .iter()
        .map(|l| {
            vec![
                l.name.clone(),
                l.url.clone(),
                l.ssh_host(),
                l.user.clone(),
                l.default.to_string(),
            ]
        })
        .collect();

    output.table(&["Name", "URL", "SSHHost", "User", "Default"], &rows);
    Ok(())
}

fn add(args: AddArgs, session: &mut Session<'_>) -> Result<()> {
    let output = session.output();
    let mut login = create_login(session.config(), args, &GiteaServer { output })?;

    let name = login.name.clone();
    let user = login.user.clone();
    session.update(|config| {
        if config.logins.is_empty() {
            login.default = true;
        }
        config.add(login)
    })?;

    if user.is_empty() {
        output.success(&format!("Login as {} succeeded", name));
    } else {
        output.success(&format!("Login as {} on {} succeeded", user, name));
    }
    Ok(())
}

/// Builds a new login from the `add` arguments.
///
/// Without a token or SSH key, `--user` and `--password` are required and
/// a fresh access token is created on the server. A token is verified
/// unless `--no-verify` is set; the verified user fills in the username.
pub fn create_login<S: LoginServer>(config: &Config, args: AddArgs, server: &S) -> Result<Login> {
    if args.url.trim().is_empty() {
        bail!("You have to input Gitea server URL");
    }

    let name = args.name.clone().unwrap_or_default();
    if let Some(existing) = config
        .logins
        .iter()
        .find(|l| !name.is_empty() && l.name.eq_ignore_ascii_case(&name))
    {
        bail!("login name '{}' has already been used", existing.name);
    }

    if let Some(existing) = config.get_by_token(&args.token) {
        bail!("token already been used, delete login '{}' first", existing.name);
    }

    let user = args.user.unwrap_or_default();
    let password = args.password.unwrap_or_default();
    let ssh_key = args.ssh_key.unwrap_or_default();
    if args.token.is_empty() && ssh_key.is_empty() {
        match (user.is_empty(), password.is_empty()) {
            (true, true) => bail!("No token set"),
            (false, true) => bail!("No password set"),
            (true, false) => bail!("No user set"),
            (false, false) => {}
        }
    }

    let url = normalize_server_url(&args.url)?;
    let mut login = Login::new(name, url, args.token);
    login.insecure = args.insecure;
    login.ssh_key = ssh_key;
    login.user = user.clone();
    login.default = args.default || config.logins.is_empty();
    login.created = chrono::Utc::now().timestamp();

    if login.token.is_empty() && login.ssh_key.is_empty() {
        let credentials = Credentials {
            user,
            password,
            otp: args.otp.filter(|o| !o.is_empty()),
            scopes: parse_scopes(&args.scopes),
        };
        login.token = server
            .create_token(&login, &credentials)
            .context("Failed to create access token")?;
    }

    if !args.no_verify && !login.token.is_empty() {
        let user = server
            .user_info(&login)
            .context("Failed to verify token")?;
        login.user = user.login;
    }

    if login.name.trim().is_empty() {
        login.name = config.generate_login_name(&login.url, &login.user)?;
    }

    Ok(login)
}

/// Name for a token created by `login add`: `<host>-tea`, with the current
/// time appended when that name is already taken
pub fn token_name(host: &str, existing: &[AccessToken], now: DateTime<Local>) -> String {
    let name = format!("{}-tea", host);
    if existing.iter().any(|t| t.name == name) {
        return format!("{}{}", name, now.format("%Y-%m-%d_%H-%M-%S"));
    }
    name
}

fn parse_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn local_hostname() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .chain(std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .find(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn default(name: Option<&str>, session: &mut Session<'_>) -> Result<()> {
    let Some(name) = name else {
        let login = session.config().get_default()?;
        if session.output().is_structured() {
            session.output().data(&serde_json::json!({ "default": login.name }));
        } else {
            println!("Default Login: {}", login.name);
        }
        return Ok(());
    };

    session.update(|config| config.set_default(name))?;
    session
        .output()
        .success(&format!("Default login set to {}", name));
    Ok(())
}

/// Removes a login; shared by `login delete` and `logout`
pub fn delete(name: &str, session: &mut Session<'_>) -> Result<()> {
    let removed = session.update(|config| config.delete(name))?;
    session
        .output()
        .success(&format!("Removed login {}", removed.name));
    Ok(())
}
