//! Commands that act on the resolved context (whoami, context, open, remotes)

use anyhow::{Context as _, Result};

use super::session::Session;
use crate::api::GiteaClient;
use crate::context::{match_by_remote, parse_remote_urls, Requirement};

/// Show the user owning the selected login's token
pub fn whoami(session: &Session<'_>) -> Result<()> {
    let ctx = session.context(Requirement::NONE)?;
    let output = session.output();
    output.verbose_ctx("whoami", &format!("Querying {}", ctx.login().url));

    let user = GiteaClient::new(ctx.login())
        .get_my_user_info()
        .with_context(|| format!("Failed to fetch user for login '{}'", ctx.login().name))?;

    if output.is_structured() {
        output.data(&user);
    } else {
        let rows = vec![vec![
            user.login.clone(),
            user.full_name.clone(),
            user.email.clone(),
            ctx.login().url.clone(),
        ]];
        output.table(&["Login", "Full Name", "Email", "Server"], &rows);
    }
    Ok(())
}

/// Show the resolved login and repository
pub fn context(session: &Session<'_>) -> Result<()> {
    let ctx = session.context(Requirement::NONE)?;
    let output = session.output();

    let local_path = ctx
        .local_repo()
        .map(|r| r.path().display().to_string())
        .unwrap_or_default();
    let branch = ctx.local_repo().and_then(|r| r.head_branch());

    if output.is_structured() {
        output.data(&serde_json::json!({
            "login": ctx.login().name,
            "login_source": ctx.login_source().as_str(),
            "url": ctx.login().url,
            "owner": ctx.owner(),
            "repo": ctx.repo(),
            "remote": ctx.remote(),
            "local_repo": ctx.local_repo().map(|r| r.path().display().to_string()),
            "branch": branch,
        }));
        return Ok(());
    }

    let fields = [
        ("Login", ctx.login().name.clone()),
        ("Source", ctx.login_source().as_str().to_string()),
        ("URL", ctx.login().url.clone()),
        ("Owner", ctx.owner().to_string()),
        ("Repo", ctx.repo().to_string()),
        ("Remote", ctx.remote().unwrap_or_default().to_string()),
        ("Local", local_path),
        ("Branch", branch.unwrap_or_default()),
    ];
    for (label, value) in fields {
        println!("{:<8} {}", format!("{}:", label), value);
    }
    Ok(())
}

/// Print the web URL of the repository
pub fn open(session: &Session<'_>) -> Result<()> {
    let ctx = session.context(Requirement::REMOTE_REPO)?;
    let url = ctx.repo_web_url();

    if session.output().is_structured() {
        session.output().data(&serde_json::json!({ "url": url }));
    } else {
        println!("{}", url);
    }
    Ok(())
}

/// List the local repository's remotes, the login each one matches and
/// the local branches tracking it
pub fn remotes(session: &Session<'_>) -> Result<()> {
    let ctx = session.context(Requirement::LOCAL_CHECKOUT)?;
    let output = session.output();

    let Some(repo) = ctx.local_repo() else {
        return Ok(());
    };
    let logins = &session.config().logins;
    let branches = repo.branches()?;

    let rows: Vec<Vec<String>> = repo
        .remotes()?
        .into_iter()
        .map(|remote| {
            let matched = match_by_remote(&parse_remote_urls(&remote.urls), logins);
            let (login, slug) = matched
                .map(|(login, slug)| (login.name, slug))
                .unwrap_or_default();
            let selected = ctx.remote() == Some(remote.name.as_str());
            let tracking: Vec<&str> = branches
                .iter()
                .filter(|(_, t)| t.remote.as_deref() == Some(remote.name.as_str()))
                .map(|(branch, _)| branch.as_str())
                .collect();
            vec![
                remote.name.clone(),
                remote.urls.join(","),
                login,
                slug,
                tracking.join(","),
                selected.to_string(),
            ]
        })
        .collect();

    output.verbose_ctx("remotes", &format!("{} remotes found", rows.len()));
    output.table(&["Name", "URL", "Login", "Repo", "Branches", "Selected"], &rows);
    Ok(())
}
