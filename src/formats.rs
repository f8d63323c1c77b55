use tracing::debug;

use crate::error::RunnerError;

/// Generator formats exercised on each host when no `--format` is given,
/// keyed by `std::env::consts::OS`.
pub const PLATFORM_FORMATS: &[(&str, &[&str])] = &[
    ("aix", &["make"]),
    ("freebsd", &["make"]),
    ("openbsd", &["make"]),
    ("windows", &["msvs", "ninja"]),
    ("linux", &["make", "ninja"]),
    ("macos", &["make", "ninja", "xcode", "xcode-ninja"]),
];

pub fn default_formats(platform: &str) -> Result<Vec<String>, RunnerError> {
    PLATFORM_FORMATS
        .iter()
        .find(|(name, _)| *name == platform)
        .map(|(_, formats)| formats.iter().map(|f| f.to_string()).collect())
        .ok_or_else(|| RunnerError::UnsupportedPlatform(platform.to_string()))
}

/// Explicit formats are taken verbatim; an empty list falls back to the platform table.
pub fn resolve_formats(explicit: &[String], platform: &str) -> Result<Vec<String>, RunnerError> {
    let formats = if explicit.is_empty() {
        default_formats(platform)?
    } else {
        explicit.to_vec()
    };

    debug!(platform, ?formats, "resolved formats");
    Ok(formats)
}
