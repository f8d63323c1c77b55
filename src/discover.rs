use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::error::RunnerError;

const TEST_PREFIX: &str = "gyptest";
const TEST_SUFFIX: &str = ".py";
const VCS_DIRS: &[&str] = &[".git", ".svn", ".hg", ".bzr", "CVS"];

pub fn is_test_name(name: &str) -> bool {
    name.starts_with(TEST_PREFIX) && name.ends_with(TEST_SUFFIX)
}

fn is_vcs_dir(name: &str) -> bool {
    VCS_DIRS.contains(&name)
}

/// Resolves the positional arguments into the ordered list of test scripts.
///
/// An empty argument list needs `all`, which selects `default_dir`.
/// Directories are expanded recursively, files must carry a test name.
pub async fn resolve_tests(args: &[PathBuf], all: bool, default_dir: &Path) -> Result<Vec<PathBuf>> {
    let defaulted;
    let args = if args.is_empty() {
        if !all {
            return Err(RunnerError::NoTestsSelected.into());
        }
        defaulted = [default_dir.to_path_buf()];
        &defaulted[..]
    } else {
        args
    };

    let mut tests = Vec::new();
    for arg in args {
        if tokio::fs::metadata(arg).await.is_ok_and(|m| m.is_dir()) {
            tests.extend(find_test_files(&normalize(arg)).await?);
            continue;
        }

        let valid = arg
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_test_name);
        if !valid {
            return Err(RunnerError::InvalidTestName(arg.display().to_string()).into());
        }
        tests.push(arg.clone());
    }

    debug!(count = tests.len(), "resolved tests");
    Ok(tests)
}

pub async fn find_test_files(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();

    tokio::task::spawn_blocking(move || find_test_files_sync(&root)).await?
}

fn find_test_files_sync(root: &Path) -> Result<Vec<PathBuf>> {
    std::fs::read_dir(root).map_err(|e| RunnerError::Walk {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;

    // Symlinked directories are never entered.
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.depth() > 0 && entry.file_name().to_str().is_some_and(is_vcs_dir))
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        if entry.path_is_symlink() && std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
            continue;
        }

        if entry.file_name().to_str().is_some_and(is_test_name) {
            files.push(entry.into_path());
        }
    }

    files.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    debug!(root = %root.display(), count = files.len(), "walked test directory");
    Ok(files)
}

/// Lexical cleanup: drops `.` segments and folds `name/..` pairs without
/// touching the filesystem. Leading `..` segments of a relative path stay.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    let cleaned: PathBuf = parts.iter().collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
