//! Shared domain types for stegtriage
//!
//! These are the closed enumerations every layer agrees on: the content
//! category derived from the MIME probe, the per-tool result status, and the
//! input validation security level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image sub-format, used to pick the format-specific branch of the image phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Other,
}

/// Coarse classification of the input file, determined once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "format")]
pub enum ContentCategory {
    Image(ImageFormat),
    Audio,
    Video,
    Generic,
}

impl ContentCategory {
    /// Classify a MIME type such as `image/png` or `audio/x-wav`.
    ///
    /// Parameters (`; charset=binary`) and case are ignored.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let (top, sub) = essence.split_once('/').unwrap_or((essence.as_str(), ""));

        match top {
            "image" => Self::Image(match sub {
                "png" | "apng" => ImageFormat::Png,
                "jpeg" | "jpg" | "pjpeg" => ImageFormat::Jpeg,
                "gif" => ImageFormat::Gif,
                "bmp" | "x-bmp" | "x-ms-bmp" => ImageFormat::Bmp,
                _ => ImageFormat::Other,
            }),
            "audio" => Self::Audio,
            "video" => Self::Video,
            _ => Self::Generic,
        }
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    #[must_use]
    pub const fn is_audio_or_video(&self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(format) => write!(f, "image ({format:?})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Terminal status of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolStatus {
    Success,
    Warning,
    Timeout,
    Error,
    SkippedUnavailable,
    /// The operator interrupted the tool while it was running.
    Interrupted,
}

impl ToolStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::SkippedUnavailable => "skipped-unavailable",
            Self::Interrupted => "interrupted",
        }
    }

    /// Glyph used on console status lines.
    #[must_use]
    pub const fn glyph(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Timeout => "⏱",
            Self::Error => "✗",
            Self::SkippedUnavailable => "-",
            Self::Interrupted => "!",
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "timeout" => Ok(Self::Timeout),
            "error" => Ok(Self::Error),
            "skipped-unavailable" => Ok(Self::SkippedUnavailable),
            "interrupted" => Ok(Self::Interrupted),
            other => Err(format!("unknown tool status '{other}'")),
        }
    }
}

/// Analysis phases in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseId {
    /// File type, strings, hex preview and entropy.
    Basic,
    /// Metadata extraction.
    Metadata,
    /// Signature scan and embedded-file extraction.
    Carving,
    /// Image steganalysis, gated on image content.
    Image,
    /// Audio/video probes, gated on audio or video content.
    AudioVideo,
    /// Deep carving engines, gated on any of them being installed.
    AdvancedCarving,
}

impl PhaseId {
    /// All phases in the order a full run executes them.
    pub const ALL: [PhaseId; 6] = [
        Self::Basic,
        Self::Metadata,
        Self::Carving,
        Self::Image,
        Self::AudioVideo,
        Self::AdvancedCarving,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Metadata => "metadata",
            Self::Carving => "carving",
            Self::Image => "image",
            Self::AudioVideo => "audio-video",
            Self::AdvancedCarving => "advanced-carving",
        }
    }

    /// Human-readable title used in banners and the interactive menu.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Basic => "Basic Analysis",
            Self::Metadata => "Metadata Extraction",
            Self::Carving => "Steganography Detection & Carving",
            Self::Image => "Image Analysis",
            Self::AudioVideo => "Audio/Video Analysis",
            Self::AdvancedCarving => "Advanced Carving",
        }
    }

    /// 1-based position, matching the interactive menu numbers.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Basic => 1,
            Self::Metadata => 2,
            Self::Carving => 3,
            Self::Image => 4,
            Self::AudioVideo => 5,
            Self::AdvancedCarving => 6,
        }
    }

    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Basic),
            2 => Some(Self::Metadata),
            3 => Some(Self::Carving),
            4 => Some(Self::Image),
            5 => Some(Self::AudioVideo),
            6 => Some(Self::AdvancedCarving),
            _ => None,
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tool's exit code `1` is classified.
///
/// Many tools use `1` for "nothing found"; others use it for hard failures,
/// so the mapping is configured per tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitOnePolicy {
    Success,
    #[default]
    Warning,
    Error,
}

impl ExitOnePolicy {
    #[must_use]
    pub const fn status(self) -> ToolStatus {
        match self {
            Self::Success => ToolStatus::Success,
            Self::Warning => ToolStatus::Warning,
            Self::Error => ToolStatus::Error,
        }
    }
}

impl FromStr for ExitOnePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown exit code policy '{other}' (expected success, warning or error)"
            )),
        }
    }
}

/// Input validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Minimal,
    #[default]
    Normal,
    Paranoid,
}

impl SecurityLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Normal => "normal",
            Self::Paranoid => "paranoid",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "normal" => Ok(Self::Normal),
            "paranoid" => Ok(Self::Paranoid),
            other => Err(format!(
                "unknown security level '{other}' (expected minimal, normal or paranoid)"
            )),
        }
    }
}

/// Source of a configuration value, for attribution in verbose output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value provided via environment variable.
    Env,
    /// Value loaded from configuration file.
    Config,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => f.write_str("cli"),
            Self::Env => f.write_str("env"),
            Self::Config => f.write_str("config"),
            Self::Default => f.write_str("default"),
        }
    }
}
