//! Domain models for tea
//!
//! Contains logins, remote URLs and repository slugs without any I/O concerns.

mod login;
mod slug;
mod remote;

pub use login::Login;
pub use slug::{slug_from_segments, split_owner_repo};
pub use remote::{normalize_server_url, parse_git_remote, strip_port, RemoteUrl, Scheme, UrlError};
