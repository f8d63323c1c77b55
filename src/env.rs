use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const FORMAT_VAR: &str = "TESTGYP_FORMAT";
pub const SEARCH_PATH_VAR: &str = "PYTHONPATH";
pub const UNBUFFERED_VAR: &str = "PYTHONUNBUFFERED";
pub const PATH_VAR: &str = "PATH";

pub type EnvMap = BTreeMap<OsString, OsString>;

/// Everything a child sees in its environment except the format, which
/// changes per invocation. Built from a snapshot; the parent process
/// environment is never written.
#[derive(Debug, Clone)]
pub struct ChildEnv {
    base: EnvMap,
}

impl ChildEnv {
    /// `support_lib` and `extra_path` are expected to be absolute already.
    pub fn new<I>(inherited: I, support_lib: &Path, extra_path: &[PathBuf]) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut base: EnvMap = inherited.into_iter().collect();

        if !extra_path.is_empty() {
            let key = path_key(&base);
            let mut entries: Vec<PathBuf> = extra_path.to_vec();
            if let Some(existing) = base.get(&key) {
                entries.extend(std::env::split_paths(existing));
            }
            if let Ok(joined) = std::env::join_paths(entries) {
                base.insert(key, joined);
            }
        }

        base.insert(SEARCH_PATH_VAR.into(), support_lib.as_os_str().to_os_string());
        base.insert(UNBUFFERED_VAR.into(), "1".into());

        Self { base }
    }

    pub fn from_process(support_lib: &Path, extra_path: &[PathBuf]) -> Self {
        Self::new(std::env::vars_os(), support_lib, extra_path)
    }

    pub fn get(&self, key: &str) -> Option<&OsString> {
        self.base.get(&OsString::from(key))
    }

    /// A fresh map for one invocation under `format`.
    pub fn for_format(&self, format: &str) -> EnvMap {
        let mut env = self.base.clone();
        env.insert(FORMAT_VAR.into(), format.into());
        env
    }
}

/// The inherited spelling of the search-path key. Windows matches
/// variable names case-insensitively and usually spells it `Path`.
#[cfg(windows)]
fn path_key(env: &EnvMap) -> OsString {
    env.keys()
        .find(|k| k.to_str().is_some_and(|k| k.eq_ignore_ascii_case(PATH_VAR)))
        .cloned()
        .unwrap_or_else(|| PATH_VAR.into())
}

#[cfg(not(windows))]
fn path_key(_env: &EnvMap) -> OsString {
    PATH_VAR.into()
}
