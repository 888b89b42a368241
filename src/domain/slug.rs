//! Repository slugs (`owner/repo`)

/// Splits a slug into owner and repo.
///
/// A bare name takes `default_owner` as its owner; an empty slug yields two
/// empty strings.
pub fn split_owner_repo(slug: &str, default_owner: &str) -> (String, String) {
    let slug = slug.trim().trim_matches('/');
    if slug.is_empty() {
        return (String::new(), String::new());
    }

    let mut parts = slug.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) => (owner.to_string(), repo.to_string()),
        _ => (default_owner.to_string(), slug.to_string()),
    }
}

/// Builds the `owner/repo` slug from the last two segments of a path
pub fn slug_from_segments(segments: &[&str]) -> Option<String> {
    match segments {
        [.., owner, repo] => Some(format!("{}/{}", owner, repo)),
        _ => None,
    }
}
