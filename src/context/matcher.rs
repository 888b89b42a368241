//! Matching git remotes against configured logins

use tracing::debug;

use crate::domain::{parse_git_remote, slug_from_segments, strip_port, Login, RemoteUrl};

/// Parses remote URL strings, skipping the ones that cannot be parsed
pub fn parse_remote_urls<S: AsRef<str>>(urls: &[S]) -> Vec<RemoteUrl> {
    urls.iter()
        .filter_map(|raw| match parse_git_remote(raw.as_ref()) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Skipping remote URL: {}", e);
                None
            }
        })
        .collect()
}

/// Finds the first login serving one of the given remote URLs.
///
/// Remotes are tried in order, and for each remote the logins in list order.
/// Returns the login together with the `owner/repo` slug taken from the URL.
pub fn match_by_remote(remote_urls: &[RemoteUrl], logins: &[Login]) -> Option<(Login, String)> {
    for remote in remote_urls {
        for login in logins {
            if let Some(slug) = match_login(remote, login) {
                debug!(login = %login.name, remote = %remote, slug = %slug, "remote matches login");
                return Some((login.clone(), slug));
            }
        }
    }
    None
}

/// Returns the repo slug when `remote` is served by `login`
fn match_login(remote: &RemoteUrl, login: &Login) -> Option<String> {
    if remote.scheme.is_http() {
        let base = login.base_url();
        let candidate = remote.to_string();
        let rest = strip_prefix_ignore_case(&candidate, &base)?;
        // Prefix must end at a path boundary: gitea.com must not match gitea.company.com
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        slug_from_segments(&remote.segments())
    } else {
        let host = login.ssh_hostname();
        if host.is_empty() || !host.eq_ignore_ascii_case(strip_port(&remote.host)) {
            return None;
        }
        let slug = remote.path.trim_start_matches('/');
        (!slug.is_empty()).then(|| slug.to_string())
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(name: &str, url: &str) -> Login {
        Login::new(name, url, "token")
    }

    fn urls(raw: &[&str]) -> Vec<RemoteUrl> {
        parse_remote_urls(raw)
    }

    #[test]
    fn https_remote_matches_by_prefix() {
        let logins = vec![login("work", "https://gitea.example.com")];
        let (found, slug) =
            match_by_remote(&urls(&["https://gitea.example.com/alice/tea.git"]), &logins).unwrap();
        assert_eq!(found.name, "work");
        assert_eq!(slug, "alice/tea");
    }

    #[test]
    fn https_remote_on_subpath_uses_last_two_segments() {
        let logins = vec![login("work", "https://example.com/gitea")];
        let (_, slug) =
            match_by_remote(&urls(&["https://example.com/gitea/alice/tea"]), &logins).unwrap();
        assert_eq!(slug, "alice/tea");
    }

    #[test]
    fn https_prefix_respects_host_boundary() {
        let logins = vec![login("short", "https://gitea.com")];
        assert!(match_by_remote(&urls(&["https://gitea.company.com/a/b.git"]), &logins).is_none());
    }

    #[test]
    fn https_remote_with_credentials_still_matches() {
        let logins = vec![login("work", "https://gitea.example.com")];
        let remote = urls(&["https://alice:pw@gitea.example.com/alice/tea.git"]);
        assert!(match_by_remote(&remote, &logins).is_some());
    }

    #[test]
    fn scheme_mismatch_does_not_match() {
        let logins = vec![login("work", "https://gitea.example.com")];
        assert!(match_by_remote(&urls(&["http://gitea.example.com/a/b"]), &logins).is_none());
    }

    #[test]
    fn ssh_remote_matches_by_host() {
        let logins = vec![login("work", "https://gitea.example.com")];
        let (found, slug) =
            match_by_remote(&urls(&["git@gitea.example.com:alice/tea.git"]), &logins).unwrap();
        assert_eq!(found.name, "work");
        assert_eq!(slug, "alice/tea");
    }

    #[test]
    fn ssh_remote_port_is_ignored() {
        let mut l = login("work", "https://gitea.example.com");
        l.ssh_host = "ssh.example.com".to_string();
        let remote = urls(&["ssh://git@ssh.example.com:2222/alice/tea.git"]);
        let (_, slug) = match_by_remote(&remote, &[l]).unwrap();
        assert_eq!(slug, "alice/tea");
    }

    #[test]
    fn first_remote_then_first_login_wins() {
        let logins = vec![
            login("a", "https://one.example.com"),
            login("b", "https://two.example.com"),
            login("c", "https://two.example.com"),
        ];
        let remote = urls(&[
            "https://nowhere.example.com/x/y",
            "https://two.example.com/o/r",
            "https://one.example.com/o/r",
        ]);
        let (found, _) = match_by_remote(&remote, &logins).unwrap();
        assert_eq!(found.name, "b");
    }

    #[test]
    fn no_match() {
        let logins = vec![login("work", "https://gitea.example.com")];
        assert!(match_by_remote(&urls(&["https://github.com/a/b"]), &logins).is_none());
        assert!(match_by_remote(&[], &logins).is_none());
    }

    #[test]
    fn unparseable_urls_are_skipped() {
        let parsed = urls(&["::::", "https://gitea.example.com/a/b"]);
        assert_eq!(parsed.len(), 1);
    }
}
