use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::{FileConfig, RunConfig};
use crate::discover::resolve_tests;
use crate::env::ChildEnv;
use crate::exec::{Launcher, ProcessLauncher};
use crate::formats::resolve_formats;
use crate::matrix::Matrix;
use crate::report::{ConsoleReporter, Header, Reporter};

/// Entry point behind `main`: applies `--chdir`, merges configuration and
/// runs against real subprocesses and stdout.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(dir) = &cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir()?;
    let file = FileConfig::load(&cwd).await?;
    let config = RunConfig::merge(cli, file);
    debug!(?config, "merged configuration");

    let env = ChildEnv::from_process(
        &absolutize(&cwd, &config.support_lib),
        &config
            .extra_path
            .iter()
            .map(|p| absolutize(&cwd, p))
            .collect::<Vec<_>>(),
    );

    let mut reporter = ConsoleReporter::stdout(config.quiet);
    execute(
        &config,
        &env,
        std::env::consts::OS,
        &ProcessLauncher,
        &mut reporter,
    )
    .await
}

/// Discovery, format resolution and the matrix, with every side effect
/// routed through `launcher` and `reporter`.
pub async fn execute<L, R>(
    config: &RunConfig,
    env: &ChildEnv,
    platform: &str,
    launcher: &L,
    reporter: &mut R,
) -> Result<ExitCode>
where
    L: Launcher,
    R: Reporter,
{
    let tests = resolve_tests(&config.tests, config.all, &config.test_dir).await?;

    if config.list {
        for test in &tests {
            reporter.on_listed(test);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let formats = resolve_formats(&config.formats, platform)?;
    let gyp_args = config.gyp_args();
    let matrix = Matrix {
        formats: &formats,
        tests: &tests,
        interpreter: &config.interpreter,
        gyp_args: &gyp_args,
        env,
    };

    if !config.quiet {
        let version = if config.no_exec {
            None
        } else {
            launcher.probe_version(&config.interpreter).await
        };
        let search_path = env
            .get(crate::env::SEARCH_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_default();
        reporter.on_header(&Header::for_host(
            &config.interpreter,
            version,
            search_path,
            &config.gyp_options,
        ));
    }

    if config.no_exec {
        for invocation in matrix.plan() {
            reporter.on_planned(&invocation);
        }
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        tests = tests.len(),
        formats = formats.len(),
        "running test matrix"
    );
    let (_, summary) = matrix.run(launcher, reporter).await;
    reporter.on_finish(&summary);

    if summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
