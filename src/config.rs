use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::cli::Cli;
use crate::error::RunnerError;

pub const CONFIG_FILE: &str = "gyptest.toml";
pub const DEFAULT_INTERPRETER: &str = "python3";
pub const DEFAULT_TEST_DIR: &str = "test";
pub const DEFAULT_SUPPORT_LIB: &str = "test/lib";

/// Optional per-checkout defaults read from `gyptest.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub interpreter: Option<String>,
    pub formats: Vec<String>,
    pub gyp_options: Vec<String>,
    pub path: Vec<PathBuf>,
    pub test_dir: Option<PathBuf>,
    pub support_lib: Option<PathBuf>,
}

impl FileConfig {
    pub async fn load(dir: &Path) -> Result<Self, RunnerError> {
        let path = dir.join(CONFIG_FILE);
        if fs::metadata(&path).await.is_err() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| RunnerError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Self::parse(&content).map_err(|message| RunnerError::Config { path, message })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }
}

/// Fully merged settings for one run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tests: Vec<PathBuf>,
    pub all: bool,
    pub formats: Vec<String>,
    pub chdir: Option<PathBuf>,
    pub gyp_options: Vec<String>,
    pub quiet: bool,
    pub extra_path: Vec<PathBuf>,
    pub list: bool,
    pub no_exec: bool,
    pub interpreter: String,
    pub test_dir: PathBuf,
    pub support_lib: PathBuf,
}

impl RunConfig {
    /// Command-line values win over the file; repeatable values are appended after the file's.
    pub fn merge(cli: Cli, file: FileConfig) -> Self {
        let formats = match cli.format.as_deref() {
            Some(list) if !list.is_empty() => list.split(',').map(str::to_string).collect(),
            _ => file.formats,
        };

        let mut gyp_options = file.gyp_options;
        gyp_options.extend(cli.gyp_option);

        let mut extra_path = file.path;
        extra_path.extend(cli.path);

        Self {
            tests: cli.tests,
            all: cli.all,
            formats,
            chdir: cli.chdir,
            gyp_options,
            quiet: cli.quiet,
            extra_path,
            list: cli.list,
            no_exec: cli.no_exec,
            interpreter: cli
                .interpreter
                .or(file.interpreter)
                .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            test_dir: file
                .test_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_DIR)),
            support_lib: file
                .support_lib
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUPPORT_LIB)),
        }
    }

    /// The `-G key=value` pairs forwarded to every test.
    pub fn gyp_args(&self) -> Vec<String> {
        self.gyp_options
            .iter()
            .flat_map(|option| ["-G".to_string(), option.clone()])
            .collect()
    }
}
