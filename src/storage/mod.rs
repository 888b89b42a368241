//! # Storage Layer
//!
//! Persistence of logins and preferences.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Logins, preferences | YAML | `~/.config/tea/config.yml` or `$TEA_CONFIG` |
//!
//! Writes go to a temp file under an `fs2` lock and are renamed into place.

mod config;

pub use config::{Config, ConfigError, ConfigStore, FlagDefaults, Preferences};
