use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "gyptest",
    version,
    about = "Test runner for GYP tests: runs gyptest*.py scripts across generator formats"
)]
pub struct Cli {
    #[arg(short, long, help = "Run all tests under the default test directory")]
    pub all: bool,

    #[arg(short = 'C', long, value_name = "DIR", help = "Change to directory before doing anything")]
    pub chdir: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "LIST",
        help = "Run tests with the specified comma-separated formats"
    )]
    pub format: Option<String>,

    #[arg(
        short = 'G',
        long = "gyp_option",
        value_name = "OPT",
        help = "Add -G options to the gyp command line (repeatable)"
    )]
    pub gyp_option: Vec<String>,

    #[arg(short, long, help = "List available tests and exit")]
    pub list: bool,

    #[arg(short, long = "no-exec", help = "No execute, just print the command lines")]
    pub no_exec: bool,

    #[arg(long, value_name = "DIR", help = "Additional $PATH directory (repeatable)")]
    pub path: Vec<PathBuf>,

    #[arg(short, long, help = "Quiet, don't print test command lines or the report")]
    pub quiet: bool,

    #[arg(
        long,
        value_name = "PROG",
        env = "GYPTEST_INTERPRETER",
        help = "Program used to run each test script (default: python3)"
    )]
    pub interpreter: Option<String>,

    #[arg(help = "Test files or directories to run")]
    pub tests: Vec<PathBuf>,
}
