use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("CSV error: {source} (path: {path})")]
    Csv { source: csv::Error, path: PathBuf },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Repository {name} already exists at {}", path.display())]
    RepositoryExists { name: String, path: PathBuf },

    #[error("Result directory for snapshot {snapshot} in the project {project} already exists")]
    SnapshotAnalyzed { project: String, snapshot: String },

    #[error("No commit found near {target} in repository {repository}")]
    NoCommitNear { repository: String, target: String },

    #[error("Unknown architecture smell \"{kind}\" in {}", path.display())]
    UnknownSmell { kind: String, path: PathBuf },

    #[error("Malformed row {row} in {}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        row: u64,
        reason: String,
    },

    #[error("Metric \"{metric}\" not found in {}", path.display())]
    MetricNotFound { metric: String, path: PathBuf },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to run {program}: {source}")]
    Process {
        program: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        PipelineError::Io {
            source,
            path: path.into(),
        }
    }

    pub fn csv(source: csv::Error, path: impl Into<PathBuf>) -> Self {
        PipelineError::Csv {
            source,
            path: path.into(),
        }
    }
}

// Allow `?` on std::io::Error by converting to PipelineError::Io with unknown path.
impl From<std::io::Error> for PipelineError {
    fn from(source: std::io::Error) -> Self {
        PipelineError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl From<walkdir::Error> for PipelineError {
    fn from(e: walkdir::Error) -> Self {
        let path = e
            .path()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("<unknown>"));
        let source = e
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
        PipelineError::Io { source, path }
    }
}
