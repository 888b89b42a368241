//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Login | Credential management | `login`, `login add`, `login default`, `logout` |
//! | Context | Resolution inspection | `context`, `remotes`, `whoami` |
//! | Repo | Repository helpers | `open` |
//!
//! ## Output Formats
//!
//! All commands support the `--output` flag: `simple`, `table` (default),
//! `csv`, `tsv`, `yaml` and `json`.
//!
//! ## Context Flags
//!
//! `--login`, `--repo` and `--remote` override what is detected from the
//! local git repository. See [`crate::context`] for the resolution order.
//!
//! ## Entry Point
//!
//! Parse a [`Cli`], call [`init_tracing`], then [`run()`].

mod app;
mod login_cmd;
mod output;
mod repo_cmd;
mod session;

pub use app::{init_tracing, run, Cli, Commands};
pub use login_cmd::{create_login, AddArgs, LoginCommands};
pub use output::{render_table, Output, OutputFormat};
pub use session::{ContextFlags, Session};
