use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::env::ChildEnv;
use crate::exec::{Captured, Invocation, Launcher};
use crate::report::Reporter;

/// Exit code a test uses to say it does not apply to the current format.
pub const SKIP_EXIT_CODE: i32 = 2;

/// Trailing output lines that mark an unremarkable run.
pub const QUIET_MARKERS: &[&str] = &["PASSED", "NO RESULT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    /// Signal deaths arrive as `None` and count as failures.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Outcome::Passed,
            Some(SKIP_EXIT_CODE) => Outcome::Skipped,
            _ => Outcome::Failed,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub format: String,
    pub test: PathBuf,
    pub outcome: Outcome,
    pub elapsed: Duration,
    pub output: Vec<String>,
}

impl ExecutionResult {
    pub fn label(&self) -> String {
        format!("({}) {}", self.format, self.test.display())
    }

    /// Output worth showing: anything not ending in a quiet marker line.
    pub fn is_noteworthy(&self) -> bool {
        !self
            .output
            .last()
            .is_some_and(|line| QUIET_MARKERS.contains(&line.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub skipped: usize,
    /// `(format) test` labels, in execution order.
    pub failed: Vec<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, result: &ExecutionResult) {
        self.total += 1;
        match result.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed.push(result.label()),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// The full (format × test) matrix, format-major.
pub struct Matrix<'a> {
    pub formats: &'a [String],
    pub tests: &'a [PathBuf],
    pub interpreter: &'a str,
    pub gyp_args: &'a [String],
    pub env: &'a ChildEnv,
}

impl Matrix<'_> {
    pub fn total(&self) -> usize {
        self.formats.len() * self.tests.len()
    }

    pub fn plan(&self) -> Vec<Invocation> {
        let total = self.total();
        let mut invocations = Vec::with_capacity(total);

        for format in self.formats {
            let env = self.env.for_format(format);
            for test in self.tests {
                let mut args = vec![test.display().to_string()];
                args.extend(self.gyp_args.iter().cloned());

                invocations.push(Invocation {
                    index: invocations.len() + 1,
                    total,
                    format: format.clone(),
                    test: test.clone(),
                    program: self.interpreter.to_string(),
                    args,
                    env: env.clone(),
                });
            }
        }

        invocations
    }

    /// Runs every invocation in order, one child at a time. A test that hangs
    /// blocks the run; there is no timeout.
    pub async fn run<L, R>(&self, launcher: &L, reporter: &mut R) -> (Vec<ExecutionResult>, RunSummary)
    where
        L: Launcher,
        R: Reporter,
    {
        let run_start = Instant::now();
        let mut summary = RunSummary::default();
        let mut results = Vec::with_capacity(self.total());

        for invocation in self.plan() {
            reporter.on_start(&invocation);

            let start = Instant::now();
            let captured = match launcher.launch(&invocation).await {
                Ok(captured) => captured,
                Err(e) => Captured {
                    code: None,
                    lines: vec![format!("{e:#}")],
                },
            };

            let result = ExecutionResult {
                format: invocation.format.clone(),
                test: invocation.test.clone(),
                outcome: Outcome::from_exit_code(captured.code),
                elapsed: start.elapsed(),
                output: captured.lines,
            };

            summary.record(&result);
            reporter.on_complete(&invocation, &result);
            results.push(result);
        }

        summary.elapsed = run_start.elapsed();
        (results, summary)
    }
}

/// `ceil(log10(total))`, at least 1.
pub fn index_width(total: usize) -> usize {
    let mut width = 0;
    let mut reach = 1usize;
    while reach < total {
        reach = reach.saturating_mul(10);
        width += 1;
    }
    width.max(1)
}
