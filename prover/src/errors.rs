use crate::models::Stage;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use zk_proofs::ZkError;

/// How an external tool ended when it did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitInfo {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}")?,
            None => write!(f, "no exit code (terminated by signal)")?,
        }
        let excerpt = stderr_excerpt(&self.stderr);
        if !excerpt.is_empty() {
            write!(f, ": {excerpt}")?;
        }
        Ok(())
    }
}

const STDERR_EXCERPT_CHARS: usize = 400;

fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.chars().count() <= STDERR_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(STDERR_EXCERPT_CHARS).collect();
    format!("{head}...")
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Zk(#[from] ZkError),

    #[error("{tool} failed with {exit}")]
    ExternalToolFailure { tool: String, exit: ExitInfo },

    #[error("could not start {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("expected artifact is missing: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("malformed artifact {}: {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("{missing} is not available yet; stages must run in order")]
    OutOfOrder { missing: &'static str },

    #[error("proof verification rejected: {output}")]
    VerificationRejected { output: String },

    #[error("dataset: {0}")]
    Dataset(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A pipeline error tagged with the stage it aborted.
#[derive(Debug, Error)]
#[error("stage {}/{} ({stage}) failed: {cause}", .stage.index(), Stage::COUNT)]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub cause: PipelineError,
}
