use crate::analysis::nearest::resolve_nearest;
use crate::error::{PipelineError, Result};
use crate::models::commit::Commit;
use chrono::{DateTime, Utc};
use git2::{build::CheckoutBuilder, Oid, Repository, Sort};
use regex::Regex;
use std::path::Path;

/// Repository name from a clone URL or path, e.g. `commons-io` for
/// `https://github.com/apache/commons-io.git`.
pub fn repo_name_from_url(url: &str) -> Result<String> {
    let pattern = Regex::new(r"^.*[/\\]([^/\\]+?)(?:\.git)?[/\\]?$")?;
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| PipelineError::InvalidRepositoryUrl(url.to_string()))
}

pub fn clone_repository(url: &str, into: &Path) -> Result<Repository> {
    log::info!("Cloning {url}");
    Ok(Repository::clone(url, into)?)
}

/// Every commit reachable from HEAD, oldest first.
pub fn commit_history(repo: &Repository) -> Result<Vec<Commit>> {
    walk_from_head(repo, Sort::TIME | Sort::REVERSE)
}

/// Commit reachable from the current HEAD whose author time is nearest to `target`.
pub fn find_commit_near(repo: &Repository, target: DateTime<Utc>) -> Result<Option<Commit>> {
    let ancestry = walk_from_head(repo, Sort::TIME)?;
    Ok(resolve_nearest(ancestry, target))
}

/// Detach HEAD at `commit` and force the working tree to match it.
pub fn checkout_commit(repo: &Repository, commit: &Commit) -> Result<()> {
    let oid = Oid::from_str(&commit.id)?;
    repo.set_head_detached(oid)?;
    repo.checkout_head(Some(CheckoutBuilder::new().force().remove_untracked(true)))?;
    log::debug!("Checked out {} ({})", commit.id, commit.date);
    Ok(())
}

fn walk_from_head(repo: &Repository, sorting: Sort) -> Result<Vec<Commit>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(sorting)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        let seconds = commit.author().when().seconds();
        let Some(authored_at) = DateTime::from_timestamp(seconds, 0) else {
            log::warn!("Skipping commit {} with out-of-range author time {seconds}", commit.id());
            continue;
        };
        commits.push(Commit::new(commit.id().to_string(), authored_at));
    }

    Ok(commits)
}
