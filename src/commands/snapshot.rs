use crate::analysis::sampler::sample_commits;
use crate::commands::git::{
    checkout_commit, clone_repository, commit_history, find_commit_near, repo_name_from_url,
};
use crate::commands::settings::Settings;
use crate::error::{PipelineError, Result};
use crate::models::commit::Commit;
use git2::Repository;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyStats {
    pub files: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Copied(CopyStats),
    /// The destination already holds a snapshot and was left untouched.
    AlreadyPresent,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadSummary {
    pub snapshots: Vec<PathBuf>,
    pub failed_repositories: Vec<String>,
}

/// Download snapshots of every configured repository, one blocking task per
/// repository. A failing repository is logged and does not stop the others.
pub async fn download_all(settings: &Settings) -> Result<DownloadSummary> {
    let base = settings.snapshots_directory.clone();
    fs::create_dir_all(&base).map_err(|e| PipelineError::io(e, &base))?;

    let mut tasks = JoinSet::new();
    for url in settings.project_urls.iter().cloned() {
        let base = base.clone();
        let interval_weeks = settings.interval_weeks;
        tasks.spawn_blocking(move || {
            let result = download_repository(&url, &base, interval_weeks);
            (url, result)
        });
    }

    let mut summary = DownloadSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((url, Ok(snapshots))) => {
                log::info!("{url}: {} snapshots saved", snapshots.len());
                summary.snapshots.extend(snapshots);
            }
            Ok((url, Err(e))) => {
                log::error!("{url}: {e}");
                summary.failed_repositories.push(url);
            }
            Err(e) => log::error!("Download task failed: {e}"),
        }
    }

    summary.snapshots.sort();
    Ok(summary)
}

/// Clone `url`, sample its history and save one snapshot directory per sample
/// under `<base>/<repository name>/<yyyy-mm-dd>/`.
pub fn download_repository(url: &str, base: &Path, interval_weeks: u32) -> Result<Vec<PathBuf>> {
    let name = repo_name_from_url(url)?;
    let output = base.join(&name);
    if output.exists() {
        return Err(PipelineError::RepositoryExists { name, path: output });
    }

    let clone_dir = tempfile::Builder::new()
        .prefix("repo-")
        .tempdir()
        .map_err(|e| PipelineError::io(e, std::env::temp_dir()))?;
    let repo = clone_repository(url, clone_dir.path())?;

    fs::create_dir(&output).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => PipelineError::RepositoryExists {
            name: name.clone(),
            path: output.clone(),
        },
        _ => PipelineError::io(e, &output),
    })?;

    let history = commit_history(&repo)?;
    let samples = sample_commits(&history, interval_weeks);
    log::info!("{name}: {} commits, {} samples", history.len(), samples.len());

    let mut saved = Vec::with_capacity(samples.len());
    // Newest first: each checkout moves HEAD back, so later targets must go before earlier ones.
    for point in samples.iter().rev() {
        let commit = find_commit_near(&repo, point.target)?.ok_or_else(|| PipelineError::NoCommitNear {
            repository: name.clone(),
            target: point.target.to_rfc3339(),
        })?;

        let destination = output.join(point.dir_name());
        match materialize(&repo, &commit, &destination)? {
            Materialized::Copied(stats) => {
                log::info!(
                    "{name}: snapshot {} from {} ({} files, {} failed)",
                    point.dir_name(),
                    commit.id,
                    stats.files,
                    stats.failures
                );
                saved.push(destination);
            }
            Materialized::AlreadyPresent => {
                log::warn!("{name}: snapshot {} already exists, skipping", destination.display());
            }
        }
    }

    saved.reverse();
    Ok(saved)
}

/// Check out `commit` and copy the working tree into `destination`.
pub fn materialize(repo: &Repository, commit: &Commit, destination: &Path) -> Result<Materialized> {
    if is_populated(destination) {
        return Ok(Materialized::AlreadyPresent);
    }

    checkout_commit(repo, commit)?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| git2::Error::from_str("repository has no working tree"))?;
    copy_tree(workdir, destination).map(Materialized::Copied)
}

/// Recursively copy `source` into `destination`, skipping `.git`.
///
/// A file that cannot be copied, including one that already exists at the
/// destination, is logged and counted without aborting the copy.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<CopyStats> {
    fs::create_dir_all(destination).map_err(|e| PipelineError::io(e, destination))?;

    let mut stats = CopyStats::default();
    let entries = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Error walking {}: {e}", source.display());
                stats.failures += 1;
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = destination.join(relative);

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
        } else {
            copy_file(entry.path(), &target).map(|_| stats.files += 1)
        };

        if let Err(e) = result {
            log::warn!(
                "Error saving snapshot: {e} (source: {}, target: {})",
                entry.path().display(),
                target.display()
            );
            stats.failures += 1;
        }
    }

    Ok(stats)
}

fn copy_file(source: &Path, target: &Path) -> io::Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut input = File::open(source)?;
    let mut output = OpenOptions::new().write(true).create_new(true).open(target)?;
    io::copy(&mut input, &mut output)
}

/// Immediate subdirectories of `dir`, sorted by name.
pub fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(e, dir))? {
        let path = entry.map_err(|e| PipelineError::io(e, dir))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn is_populated(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_nested_files_and_skips_git_dir() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join("src/main/java")).unwrap();
        fs::create_dir_all(source.path().join(".git/objects")).unwrap();
        fs::create_dir_all(source.path().join("empty")).unwrap();
        fs::write(source.path().join("pom.xml"), "<project/>").unwrap();
        fs::write(source.path().join("src/main/java/App.java"), "class App {}").unwrap();
        fs::write(source.path().join(".git/HEAD"), "ref").unwrap();

        let target = tempfile::tempdir().unwrap();
        let destination = target.path().join("2023-01-01");
        let stats = copy_tree(source.path(), &destination).unwrap();

        assert_eq!(stats, CopyStats { files: 2, failures: 0 });
        assert_eq!(
            fs::read_to_string(destination.join("src/main/java/App.java")).unwrap(),
            "class App {}"
        );
        assert!(destination.join("empty").is_dir());
        assert!(!destination.join(".git").exists());
    }

    #[test]
    fn existing_target_file_is_skipped_not_fatal() {
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("a.txt"), "new").unwrap();
        fs::write(source.path().join("b.txt"), "b").unwrap();

        let destination = tempfile::tempdir().unwrap();
        fs::write(destination.path().join("a.txt"), "old").unwrap();

        let stats = copy_tree(source.path(), destination.path()).unwrap();
        assert_eq!(stats, CopyStats { files: 1, failures: 1 });
        assert_eq!(fs::read_to_string(destination.path().join("a.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(destination.path().join("b.txt")).unwrap(), "b");
    }
}
