use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Process exit codes for the `stubcheck` binary.
pub mod exit_code {
    /// No error-severity diagnostics.
    pub const CLEAN: i32 = 0;
    /// At least one error-severity diagnostic was reported.
    pub const DIAGNOSTICS: i32 = 1;
    /// Bad arguments, bad config, or unreadable input.
    pub const FAILURE: i32 = 2;
}

/// Operational failures while loading a stub tree. Problems *in* the stubs
/// are diagnostics, not errors.
#[derive(Error, Debug)]
pub enum StubError {
    #[error("path does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {0}: {1}")]
    Io(PathBuf, io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown rule code `{0}` (run `stubcheck rules` for the list)")]
    UnknownRule(String),

    #[error("invalid glob pattern `{0}`: {1}")]
    InvalidGlob(String, String),
}
