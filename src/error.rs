//! Error kinds surfaced by catalog operations.
//!
//! Every failure reaches the caller as a distinct variant so batch drivers can
//! tell "not ready yet" (`MissingPredecessor`, `Busy`) apart from hard errors.
use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The parameter set has no canonical encoding.
    #[error("parameter set cannot be canonically encoded: {0}")]
    Serialization(String),

    /// A restart index was requested before its predecessor output exists.
    #[error("simulation {fingerprint} #{index} requires output #{} to exist first", .index.saturating_sub(1))]
    MissingPredecessor { fingerprint: String, index: u32 },

    /// The executable ran and exited with a non-zero status.
    #[error("executable failed with {}: {stderr}", exit_code_string(.code))]
    Execution { code: Option<i32>, stderr: String },

    /// The executable exited zero without producing its output file.
    #[error("executable reported success but did not create {}", .output.display())]
    ExecutionFailure { output: PathBuf },

    #[error("no output for simulation {fingerprint} #{index}")]
    NotFound { fingerprint: String, index: u32 },

    /// Another process holds the run claim for the same output.
    #[error("simulation is already running (claim held at {})", .lock.display())]
    Busy { lock: PathBuf },

    #[error("invalid catalog configuration: {0}")]
    Config(String),

    #[error("{}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True for outcomes a caller is expected to branch on rather than abort.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            Error::MissingPredecessor { .. } | Error::NotFound { .. } | Error::Busy { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

fn exit_code_string(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}
