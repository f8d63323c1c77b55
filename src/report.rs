use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::exec::Invocation;
use crate::matrix::{ExecutionResult, RunSummary, index_width};

/// Context printed before anything runs.
#[derive(Debug, Clone)]
pub struct Header {
    pub os: String,
    pub arch: String,
    pub interpreter: String,
    pub interpreter_version: Option<String>,
    pub search_path: PathBuf,
    pub gyp_options: Vec<String>,
}

impl Header {
    pub fn for_host(
        interpreter: &str,
        interpreter_version: Option<String>,
        search_path: PathBuf,
        gyp_options: &[String],
    ) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            interpreter: interpreter.to_string(),
            interpreter_version,
            search_path,
            gyp_options: gyp_options.to_vec(),
        }
    }
}

/// Receives run events in order; the matrix never prints on its own.
pub trait Reporter {
    fn on_header(&mut self, _header: &Header) {}

    /// `--list`: one discovered test.
    fn on_listed(&mut self, _test: &Path) {}

    /// Dry run: the invocation is listed but never launched.
    fn on_planned(&mut self, _invocation: &Invocation) {}

    fn on_start(&mut self, invocation: &Invocation);

    fn on_complete(&mut self, invocation: &Invocation, result: &ExecutionResult);

    fn on_finish(&mut self, summary: &RunSummary);
}

/// Plain-text reporter in the classic gyptest layout.
pub struct ConsoleReporter<W: Write> {
    out: W,
    quiet: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(quiet: bool) -> Self {
        Self::new(io::stdout(), quiet)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, quiet: bool) -> Self {
        Self { out, quiet }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn prefix(invocation: &Invocation, command: &str) -> String {
        let width = index_width(invocation.total);
        format!(
            "[{:0width$}/{:0width$}] ({}) {}",
            invocation.index, invocation.total, invocation.format, command
        )
    }

    fn write_header(&mut self, header: &Header) -> io::Result<()> {
        writeln!(self.out, "Test configuration:")?;
        writeln!(self.out, "  {} {}", header.os, header.arch)?;
        match &header.interpreter_version {
            Some(version) => writeln!(self.out, "  {}", version)?,
            None => writeln!(self.out, "  {}", header.interpreter)?,
        }
        writeln!(self.out, "  PYTHONPATH={}", header.search_path.display())?;
        writeln!(self.out)?;

        if !header.gyp_options.is_empty() {
            writeln!(self.out, "Extra Gyp options: {}", quoted_list(&header.gyp_options))?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_completion(&mut self, result: &ExecutionResult) -> io::Result<()> {
        if !self.quiet {
            writeln!(
                self.out,
                " {} {:.3}s",
                result.outcome,
                result.elapsed.as_secs_f64()
            )?;
        }

        if result.is_noteworthy() {
            for line in &result.output {
                writeln!(self.out, "    {}", line)?;
            }
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        match summary.failed.len() {
            0 => {}
            1 => writeln!(self.out, "\nFailed the following test:")?,
            n => writeln!(self.out, "\nFailed the following {} tests:", n)?,
        }
        for label in &summary.failed {
            writeln!(self.out, "\t{}", label)?;
        }

        writeln!(
            self.out,
            "\nRan {} tests, {} failed in {:.3}s.",
            summary.total,
            summary.failed.len(),
            summary.elapsed.as_secs_f64()
        )?;
        writeln!(self.out)
    }
}

/// Renders options as `['a=1', 'b=2']`.
fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("'{}'", item.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

// Write errors are dropped; a closed stdout does not stop the matrix.
impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_header(&mut self, header: &Header) {
        if !self.quiet {
            let _ = self.write_header(header);
        }
    }

    fn on_listed(&mut self, test: &Path) {
        let _ = writeln!(self.out, "{}", test.display());
    }

    fn on_planned(&mut self, invocation: &Invocation) {
        let _ = writeln!(
            self.out,
            "{}",
            Self::prefix(invocation, &invocation.command_line())
        );
    }

    fn on_start(&mut self, invocation: &Invocation) {
        if self.quiet {
            return;
        }
        let _ = write!(
            self.out,
            "{}",
            Self::prefix(invocation, &invocation.display_args())
        );
        let _ = self.out.flush();
    }

    fn on_complete(&mut self, _invocation: &Invocation, result: &ExecutionResult) {
        let _ = self.write_completion(result);
        let _ = self.out.flush();
    }

    fn on_finish(&mut self, summary: &RunSummary) {
        if !self.quiet {
            let _ = self.write_summary(summary);
        }
        let _ = self.out.flush();
    }
}
