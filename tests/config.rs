use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use gyptest::RunnerError;
use gyptest::cli::Cli;
use gyptest::config::{CONFIG_FILE, FileConfig, RunConfig};
use gyptest::env::{ChildEnv, FORMAT_VAR, PATH_VAR, SEARCH_PATH_VAR, UNBUFFERED_VAR};
use gyptest::formats::{PLATFORM_FORMATS, default_formats, resolve_formats};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("gyptest").chain(args.iter().copied())).unwrap()
}

mod cli {
    use super::*;

    #[test]
    fn short_and_long_flags() {
        let cli = parse(&[
            "-a", "-C", "src", "-f", "make,ninja", "-G", "a=1", "--gyp_option", "b=2", "-l", "-n",
            "--path", "/opt/bin", "--path", "tools", "-q", "--interpreter", "python2",
            "test/gyptest-x.py",
        ]);

        assert!(cli.all);
        assert_eq!(cli.chdir, Some(PathBuf::from("src")));
        assert_eq!(cli.format.as_deref(), Some("make,ninja"));
        assert_eq!(cli.gyp_option, vec!["a=1", "b=2"]);
        assert!(cli.list);
        assert!(cli.no_exec);
        assert_eq!(cli.path, vec![PathBuf::from("/opt/bin"), PathBuf::from("tools")]);
        assert!(cli.quiet);
        assert_eq!(cli.interpreter.as_deref(), Some("python2"));
        assert_eq!(cli.tests, vec![PathBuf::from("test/gyptest-x.py")]);
    }

    #[test]
    fn no_arguments_is_valid_at_parse_time() {
        let cli = Cli::try_parse_from(["gyptest"]).unwrap();
        assert!(!cli.all);
        assert!(cli.tests.is_empty());
    }
}

mod merging {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfig::merge(Cli::default(), FileConfig::default());
        assert_eq!(config.interpreter, "python3");
        assert_eq!(config.test_dir, PathBuf::from("test"));
        assert_eq!(config.support_lib, PathBuf::from("test/lib"));
        assert!(config.formats.is_empty());
        assert!(config.gyp_args().is_empty());
    }

    #[test]
    fn format_list_is_split_verbatim() {
        let cli = Cli {
            format: Some("make,ninja,bogus".to_string()),
            ..Default::default()
        };
        let config = RunConfig::merge(cli, FileConfig::default());
        assert_eq!(config.formats, vec!["make", "ninja", "bogus"]);
    }

    #[test]
    fn command_line_overrides_file() {
        let file = FileConfig::parse(
            r#"
            interpreter = "python2.7"
            formats = ["xcode"]
            gyp_options = ["from=file"]
            path = ["/file/bin"]
            test_dir = "suite"
            support_lib = "suite/support"
            "#,
        )
        .unwrap();

        let cli = Cli {
            interpreter: Some("pypy".to_string()),
            format: Some("ninja".to_string()),
            gyp_option: vec!["from=cli".to_string()],
            path: vec![PathBuf::from("/cli/bin")],
            ..Default::default()
        };

        let config = RunConfig::merge(cli, file);
        assert_eq!(config.interpreter, "pypy");
        assert_eq!(config.formats, vec!["ninja"]);
        assert_eq!(config.gyp_args(), vec!["-G", "from=file", "-G", "from=cli"]);
        assert_eq!(
            config.extra_path,
            vec![PathBuf::from("/file/bin"), PathBuf::from("/cli/bin")]
        );
        assert_eq!(config.test_dir, PathBuf::from("suite"));
        assert_eq!(config.support_lib, PathBuf::from("suite/support"));
    }

    #[test]
    fn file_formats_apply_without_flag() {
        let file = FileConfig::parse("formats = [\"make\"]").unwrap();
        let config = RunConfig::merge(Cli::default(), file);
        assert_eq!(config.formats, vec!["make"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FileConfig::parse("timeout = 30").unwrap_err();
        assert!(err.contains("timeout"), "{}", err);
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig::load(dir.path()).await.unwrap();
        assert!(file.interpreter.is_none());
        assert!(file.formats.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "formats = 3").unwrap();

        match FileConfig::load(dir.path()).await {
            Err(RunnerError::Config { path, .. }) => assert_eq!(path, dir.path().join(CONFIG_FILE)),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

mod formats {
    use super::*;

    #[test]
    fn platform_table() {
        assert_eq!(default_formats("linux").unwrap(), vec!["make", "ninja"]);
        assert_eq!(default_formats("windows").unwrap(), vec!["msvs", "ninja"]);
        assert_eq!(
            default_formats("macos").unwrap(),
            vec!["make", "ninja", "xcode", "xcode-ninja"]
        );
        assert_eq!(default_formats("freebsd").unwrap(), vec!["make"]);
    }

    #[test]
    fn table_has_no_duplicate_platforms() {
        let mut names: Vec<&str> = PLATFORM_FORMATS.iter().map(|(name, _)| *name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PLATFORM_FORMATS.len());
    }

    #[test]
    fn unknown_platform_is_an_error() {
        assert!(matches!(
            default_formats("plan9"),
            Err(RunnerError::UnsupportedPlatform(p)) if p == "plan9"
        ));
    }

    #[test]
    fn explicit_list_wins_even_on_unknown_platform() {
        let explicit = vec!["ninja".to_string(), "nonsense".to_string()];
        assert_eq!(resolve_formats(&explicit, "plan9").unwrap(), explicit);
    }
}

mod child_env {
    use super::*;

    fn inherited() -> Vec<(OsString, OsString)> {
        vec![
            (OsString::from("HOME"), OsString::from("/home/gyp")),
            (OsString::from(PATH_VAR), OsString::from("/usr/bin")),
            (OsString::from(FORMAT_VAR), OsString::from("stale")),
        ]
    }

    #[test]
    fn support_variables_are_set() {
        let env = ChildEnv::new(inherited(), Path::new("/src/test/lib"), &[]);
        assert_eq!(env.get(SEARCH_PATH_VAR), Some(&OsString::from("/src/test/lib")));
        assert_eq!(env.get(UNBUFFERED_VAR), Some(&OsString::from("1")));
        assert_eq!(env.get("HOME"), Some(&OsString::from("/home/gyp")));
        assert_eq!(env.get(PATH_VAR), Some(&OsString::from("/usr/bin")));
    }

    #[test]
    fn format_is_set_per_invocation_without_leaking() {
        let env = ChildEnv::new(inherited(), Path::new("/src/test/lib"), &[]);
        let make = env.for_format("make");
        let ninja = env.for_format("ninja");

        assert_eq!(make.get(&OsString::from(FORMAT_VAR)), Some(&OsString::from("make")));
        assert_eq!(ninja.get(&OsString::from(FORMAT_VAR)), Some(&OsString::from("ninja")));
        assert_eq!(env.get(FORMAT_VAR), Some(&OsString::from("stale")));
    }

    #[cfg(unix)]
    #[test]
    fn extra_path_is_prepended() {
        let extra = vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")];
        let env = ChildEnv::new(inherited(), Path::new("/src/test/lib"), &extra);
        assert_eq!(
            env.get(PATH_VAR),
            Some(&OsString::from("/opt/a:/opt/b:/usr/bin"))
        );
    }

    #[cfg(windows)]
    #[test]
    fn extra_path_merges_into_inherited_spelling() {
        let inherited = vec![(OsString::from("Path"), OsString::from(r"C:\Windows"))];
        let extra = vec![PathBuf::from(r"C:\tools")];
        let env = ChildEnv::new(inherited, Path::new(r"C:\src\test\lib"), &extra);
        assert_eq!(env.get("Path"), Some(&OsString::from(r"C:\tools;C:\Windows")));
        assert_eq!(env.get(PATH_VAR), None);
    }

    #[test]
    fn building_never_touches_the_parent() {
        let before = std::env::var_os(FORMAT_VAR);
        let env = ChildEnv::from_process(Path::new("/src/test/lib"), &[PathBuf::from("/opt/x")]);
        let _ = env.for_format("xcode");
        assert_eq!(std::env::var_os(FORMAT_VAR), before);
        assert_ne!(
            std::env::var_os(SEARCH_PATH_VAR),
            Some(OsString::from("/src/test/lib"))
        );
    }
}
