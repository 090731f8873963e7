//! Tool registry and dependency probing
//!
//! Absence of a tool never halts a run; it only removes the steps that need it.

use serde::Serialize;

/// Tools every phase assumes. Missing ones are reported but not fatal.
pub const REQUIRED_TOOLS: &[&str] = &[
    "file", "strings", "xxd", "ent", "exiftool", "binwalk", "steghide", "convert", "ffprobe",
    "ffmpeg",
];

/// Tools that unlock additional steps when installed.
pub const OPTIONAL_TOOLS: &[&str] = &[
    "zsteg",
    "pngcheck",
    "jpeginfo",
    "stegdetect",
    "outguess",
    "exiv2",
    "stegoveritas",
    "identify",
    "tesseract",
    "mediainfo",
    "sox",
    "stegolsb",
    "stegseek",
    "foremost",
    "scalpel",
    "bulk_extractor",
    "vol",
];

/// Tools whose presence adds `Metadata/Advanced`.
pub const ADVANCED_METADATA_TOOLS: &[&str] = &["exiv2"];

/// Tools whose presence adds `Steganography/Advanced`.
pub const ADVANCED_STEGO_TOOLS: &[&str] = &["stegoveritas"];

/// Carving engines used by the advanced carving phase.
pub const CARVING_ENGINES: &[&str] = &["foremost", "scalpel", "bulk_extractor"];

/// Answers "is this tool installed?".
pub trait ToolProbe {
    fn is_available(&self, tool: &str) -> bool;
}

/// Resolves tools on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn is_available(&self, tool: &str) -> bool {
        !tool.is_empty() && which::which(tool).is_ok()
    }
}

/// Which catalogued tools are missing on this host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
    pub available_optional: Vec<String>,
    /// `Metadata/Advanced` will be created
    pub advanced_metadata: bool,
    /// `Steganography/Advanced` will be created
    pub advanced_stego: bool,
}

impl DependencyReport {
    #[must_use]
    pub fn all_required_present(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// Plain-text rendering, as written to `Logs/missing_tools.txt`.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Missing required tools:\n");
        if self.missing_required.is_empty() {
            out.push_str("  (none)\n");
        }
        for tool in &self.missing_required {
            out.push_str(&format!("  {tool}\n"));
        }
        out.push_str("\nMissing optional tools:\n");
        if self.missing_optional.is_empty() {
            out.push_str("  (none)\n");
        }
        for tool in &self.missing_optional {
            out.push_str(&format!("  {tool}\n"));
        }
        out.push_str(&format!(
            "\nAdvanced metadata tools: {}\nAdvanced steganography tools: {}\n",
            if self.advanced_metadata { "yes" } else { "no" },
            if self.advanced_stego { "yes" } else { "no" },
        ));
        out
    }
}

/// Probe both catalogs.
pub fn check_dependencies(probe: &dyn ToolProbe) -> DependencyReport {
    let missing = |tools: &[&str]| -> Vec<String> {
        tools
            .iter()
            .filter(|tool| !probe.is_available(tool))
            .map(|tool| (*tool).to_string())
            .collect()
    };

    let missing_required = missing(REQUIRED_TOOLS);
    let missing_optional = missing(OPTIONAL_TOOLS);
    let available_optional = OPTIONAL_TOOLS
        .iter()
        .filter(|tool| !missing_optional.iter().any(|m| m == *tool))
        .map(|tool| (*tool).to_string())
        .collect();

    let report = DependencyReport {
        missing_required,
        missing_optional,
        available_optional,
        advanced_metadata: ADVANCED_METADATA_TOOLS.iter().any(|t| probe.is_available(t)),
        advanced_stego: ADVANCED_STEGO_TOOLS.iter().any(|t| probe.is_available(t)),
    };

    tracing::debug!(
        missing_required = report.missing_required.len(),
        missing_optional = report.missing_optional.len(),
        "Dependency check complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticProbe;

    #[test]
    fn test_nothing_installed() {
        let report = check_dependencies(&StaticProbe::none());
        assert_eq!(report.missing_required.len(), REQUIRED_TOOLS.len());
        assert_eq!(report.missing_optional.len(), OPTIONAL_TOOLS.len());
        assert!(report.available_optional.is_empty());
        assert!(!report.advanced_metadata);
        assert!(!report.advanced_stego);
        assert!(!report.all_required_present());
    }

    #[test]
    fn test_partial_install_sets_advanced_flags() {
        let mut tools: Vec<&str> = REQUIRED_TOOLS.to_vec();
        tools.push("exiv2");
        tools.push("zsteg");
        let report = check_dependencies(&StaticProbe::with(&tools));

        assert!(report.all_required_present());
        assert!(report.advanced_metadata);
        assert!(!report.advanced_stego);
        assert_eq!(report.available_optional, vec!["zsteg", "exiv2"]);
        assert!(!report.missing_optional.contains(&"zsteg".to_string()));
    }

    #[test]
    fn test_render_text_lists_missing() {
        let report = check_dependencies(&StaticProbe::with(&["file"]));
        let text = report.render_text();
        assert!(text.contains("Missing required tools:\n  strings\n"));
        assert!(!text.contains("  file\n"));
        assert!(text.contains("Advanced metadata tools: no"));
    }
}
