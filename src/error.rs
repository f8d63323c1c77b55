use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before any test is launched.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Specify -a to get all tests.")]
    NoTestsSelected,

    #[error("{0} is not a valid gyp test name.")]
    InvalidTestName(String),

    #[error("no default formats for platform '{0}'; pass --format explicitly")]
    UnsupportedPlatform(String),

    #[error("invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to walk {}: {message}", path.display())]
    Walk { path: PathBuf, message: String },
}
