//! Workspace naming
//!
//! Workspace directories are named `<sanitised-filename>_<YYYYMMDD_HHMMSS>`.
//! The file name comes from evidence and is untrusted, so it is reduced to a
//! conservative character set before touching the filesystem.
//!
//! Paths handed to external tools go through [`option_safe_path`] so that a
//! file called `-e.png` is never parsed as a flag.

use chrono::{DateTime, TimeZone};
use std::borrow::Cow;
use std::path::{Component, Path};
use unicode_normalization::UnicodeNormalization;

use crate::error::WorkspaceError;

/// Timestamp format used in workspace directory names.
pub const WORKSPACE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sanitizes an input file name for use as a directory name component.
///
/// - Uses only the final path component
/// - Normalizes Unicode with NFKC to handle confusables
/// - Accepts only [A-Za-z0-9._-], replacing everything else with `_`
/// - Replaces consecutive dots to prevent path traversal
/// - Rejects names with no meaningful characters left
///
/// ```
/// use stegtriage_utils::paths::sanitize_file_name;
/// use std::path::Path;
///
/// assert_eq!(sanitize_file_name(Path::new("/evidence/cover.png")).unwrap(), "cover.png");
/// assert_eq!(sanitize_file_name(Path::new("my photo (1).jpg")).unwrap(), "my_photo__1_.jpg");
/// ```
pub fn sanitize_file_name(input: &Path) -> Result<String, WorkspaceError> {
    let raw = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let normalized: String = raw.nfkc().collect();

    let mut sanitized: String = normalized
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "__");
    }

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_' || c == '.') {
        return Err(WorkspaceError::InvalidName {
            input: input.display().to_string(),
        });
    }

    Ok(sanitized)
}

/// Directory name for a run started at `started_at`.
pub fn workspace_dir_name<Tz>(input: &Path, started_at: &DateTime<Tz>) -> Result<String, WorkspaceError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let name = sanitize_file_name(input)?;
    Ok(format!(
        "{name}_{}",
        started_at.format(WORKSPACE_TIMESTAMP_FORMAT)
    ))
}

/// Path form that no command-line tool can mistake for an option.
///
/// Relative paths whose first component starts with `-` get a `./` prefix.
/// Every other path is returned unchanged.
///
/// ```
/// use stegtriage_utils::paths::option_safe_path;
/// use std::path::Path;
///
/// assert_eq!(option_safe_path(Path::new("-e.png")), Path::new("./-e.png"));
/// assert_eq!(option_safe_path(Path::new("/tmp/-e.png")), Path::new("/tmp/-e.png"));
/// ```
#[must_use]
pub fn option_safe_path(path: &Path) -> Cow<'_, Path> {
    match path.components().next() {
        Some(Component::Normal(first)) if first.to_string_lossy().starts_with('-') => {
            Cow::Owned(Path::new(".").join(path))
        }
        _ => Cow::Borrowed(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(
            sanitize_file_name(Path::new("stego_sample-01.png")).unwrap(),
            "stego_sample-01.png"
        );
    }

    #[test]
    fn test_sanitize_strips_directories_and_traversal() {
        assert_eq!(
            sanitize_file_name(Path::new("../../etc/passwd")).unwrap(),
            "passwd"
        );
        assert_eq!(sanitize_file_name(Path::new("a..b.wav")).unwrap(), "a__b.wav");
    }

    #[test]
    fn test_sanitize_normalizes_fullwidth() {
        assert_eq!(
            sanitize_file_name(Path::new("ｃｏｖｅｒ.png")).unwrap(),
            "cover.png"
        );
    }

    #[test]
    fn test_sanitize_rejects_meaningless_names() {
        assert!(sanitize_file_name(Path::new("???")).is_err());
        assert!(sanitize_file_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_workspace_dir_name_format() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            workspace_dir_name(Path::new("dir/cover.jpg"), &ts).unwrap(),
            "cover.jpg_20240309_070501"
        );
    }

    #[test]
    fn test_same_second_different_files_do_not_collide() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let a = workspace_dir_name(Path::new("a.png"), &ts).unwrap();
        let b = workspace_dir_name(Path::new("b.png"), &ts).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_option_safe_path_prefixes_dash_names() {
        assert_eq!(option_safe_path(Path::new("-e.png")), Path::new("./-e.png"));
        assert_eq!(
            option_safe_path(Path::new("--help/x.wav")),
            Path::new("./--help/x.wav")
        );
        assert!(matches!(option_safe_path(Path::new("./-e.png")), Cow::Borrowed(_)));
        assert!(matches!(option_safe_path(Path::new("/abs/-e.png")), Cow::Borrowed(_)));
        assert!(matches!(option_safe_path(Path::new("cover-1.jpg")), Cow::Borrowed(_)));
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_safe(name in "\\PC{1,40}") {
            if let Ok(clean) = sanitize_file_name(Path::new(&name)) {
                prop_assert!(!clean.contains(".."));
                prop_assert!(!clean.contains('/'));
                prop_assert!(clean
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
            }
        }
    }
}
