//! Input validation by security level
//!
//! Runs before any workspace exists, so a rejected file leaves nothing behind.

use std::fs::File;
use std::path::Path;

use stegtriage_utils::error::ValidationError;
use stegtriage_utils::types::SecurityLevel;

use crate::filetype::FileTypeProbe;

/// Extensions refused at the paranoid level.
pub const DENIED_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "sh", "bash", "cmd", "bat", "ps1", "vbs", "js",
];

/// MIME types refused at the paranoid level.
const DENIED_MIME_TYPES: &[&str] = &[
    "application/x-executable",
    "application/x-pie-executable",
    "application/x-sharedlib",
    "application/x-dosexec",
    "application/x-msdownload",
    "application/x-mach-binary",
    "application/x-elf",
    "application/javascript",
    "text/javascript",
    "text/x-shellscript",
    "text/x-msdos-batch",
];

/// Limits applied while validating.
#[derive(Debug, Clone, Copy)]
pub struct ValidationPolicy {
    pub level: SecurityLevel,
    pub max_file_size: u64,
}

/// Check `path` against `policy`.
///
/// - minimal: exists and is a regular file
/// - normal: also readable, non-empty and within the size limit
/// - paranoid: also not an executable or script by extension, MIME or description
pub fn validate_input(
    path: &Path,
    policy: ValidationPolicy,
    file_types: &dyn FileTypeProbe,
) -> Result<(), ValidationError> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ValidationError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ValidationError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    if !metadata.is_file() {
        return Err(ValidationError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    if policy.level == SecurityLevel::Minimal {
        return Ok(());
    }

    File::open(path).map_err(|e| ValidationError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let size = metadata.len();
    if size == 0 {
        return Err(ValidationError::Empty {
            path: path.to_path_buf(),
        });
    }
    if size > policy.max_file_size {
        return Err(ValidationError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: policy.max_file_size,
        });
    }

    if policy.level == SecurityLevel::Paranoid {
        check_paranoid(path, file_types)?;
    }

    Ok(())
}

fn check_paranoid(path: &Path, file_types: &dyn FileTypeProbe) -> Result<(), ValidationError> {
    let reject = |reason: String| ValidationError::PolicyRejected {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_ascii_lowercase();
        if DENIED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(reject(format!("extension .{ext} is denied")));
        }
    }

    if let Some(mime) = file_types.mime_type(path) {
        let mime = mime.to_ascii_lowercase();
        if DENIED_MIME_TYPES.contains(&mime.as_str()) || mime.starts_with("text/x-script") {
            return Err(reject(format!("content type {mime} is denied")));
        }
    }

    if let Some(description) = file_types.describe(path) {
        let lowered = description.to_ascii_lowercase();
        if lowered.contains("executable") || lowered.contains("script") {
            return Err(reject(format!("content looks runnable: {description}")));
        }
    }

    Ok(())
}
