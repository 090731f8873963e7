//! MIME probing
//!
//! The content category is derived once per run from `file --mime-type`.
//! When `file` is unavailable the extension decides.

use std::path::Path;

use stegtriage_runner::CommandSpec;

/// Fallback MIME type when nothing else is known.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Identifies file content.
pub trait FileTypeProbe {
    /// MIME type such as `image/png`; `None` if it cannot be determined.
    fn mime_type(&self, path: &Path) -> Option<String>;

    /// Free-form description such as `Bourne-Again shell script, ASCII text executable`.
    fn describe(&self, path: &Path) -> Option<String>;
}

/// Uses the `file` utility.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCommandProbe;

impl FileCommandProbe {
    fn query(path: &Path, flags: &[&str]) -> Option<String> {
        let output = CommandSpec::new("file")
            .args(flags.iter().copied())
            .arg("--")
            .arg(path)
            .to_command()
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

impl FileTypeProbe for FileCommandProbe {
    fn mime_type(&self, path: &Path) -> Option<String> {
        Self::query(path, &["-b", "--mime-type"])
    }

    fn describe(&self, path: &Path) -> Option<String> {
        Self::query(path, &["-b"])
    }
}

/// Guess a MIME type from the file extension.
#[must_use]
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "wav" => "audio/x-wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "sh" | "bash" => "text/x-shellscript",
        "exe" | "dll" => "application/x-dosexec",
        _ => UNKNOWN_MIME,
    }
}

/// MIME type of `path`, falling back to the extension.
pub fn probe_mime(probe: &dyn FileTypeProbe, path: &Path) -> String {
    probe
        .mime_type(path)
        .filter(|mime| mime.contains('/'))
        .unwrap_or_else(|| {
            let guessed = mime_from_extension(path);
            tracing::debug!(path = %path.display(), mime = guessed, "MIME probe unavailable; using extension");
            guessed.to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedFileTypes;

    #[test]
    fn test_extension_fallback() {
        assert_eq!(mime_from_extension(Path::new("a/B.JPG")), "image/jpeg");
        assert_eq!(mime_from_extension(Path::new("track.wav")), "audio/x-wav");
        assert_eq!(mime_from_extension(Path::new("noext")), UNKNOWN_MIME);
    }

    #[test]
    fn test_probe_result_wins_over_extension() {
        let probe = FixedFileTypes::new("image/png", "PNG image data");
        assert_eq!(probe_mime(&probe, Path::new("renamed.wav")), "image/png");
    }

    #[test]
    fn test_garbage_probe_output_falls_back() {
        let probe = FixedFileTypes::new("cannot open", "cannot open");
        assert_eq!(probe_mime(&probe, Path::new("x.gif")), "image/gif");

        let silent = FixedFileTypes::unknown();
        assert_eq!(probe_mime(&silent, Path::new("x.mp4")), "video/mp4");
    }
}
