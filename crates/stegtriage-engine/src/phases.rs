//! Phase planner
//!
//! Each phase is a gate plus a table of steps. A step names the tool it needs
//! (if optional), a predicate over the plan context, and a builder producing
//! one or more invocations. Planning is pure: the same file, category, tool
//! set and workspace always give the same plan.

use std::path::{Path, PathBuf};

use stegtriage_runner::CommandSpec;
use stegtriage_utils::error::StegError;
use stegtriage_utils::logging;
use stegtriage_utils::paths::option_safe_path;
use stegtriage_utils::types::{ContentCategory, ImageFormat, PhaseId, ToolStatus};

use crate::execution::{ToolInvocation, ToolReport};
use crate::registry::{CARVING_ENGINES, ToolProbe};
use crate::run::{AnalysisRun, Engine};
use crate::workspace::{OutputCategory, OutputWorkspace};

/// Number of threshold images produced for image inputs.
pub const THRESHOLD_LEVELS: u32 = 8;

/// Hex preview length.
pub const HEX_PREVIEW_BYTES: &str = "1024";

/// Frames pulled from video inputs.
pub const VIDEO_FRAME_COUNT: &str = "10";

/// Everything a step builder may look at.
pub struct PlanContext<'a> {
    pub target: &'a Path,
    pub category: ContentCategory,
    pub probe: &'a dyn ToolProbe,
    pub workspace: &'a OutputWorkspace,
    pub wordlist: &'a Path,
}

impl PlanContext<'_> {
    fn has(&self, tool: &str) -> bool {
        self.probe.is_available(tool)
    }

    fn dir(&self, category: OutputCategory) -> PathBuf {
        self.workspace.dir(category)
    }

    fn extracted(&self, name: &str) -> PathBuf {
        self.dir(OutputCategory::Extracted).join(name)
    }

    fn is_format(&self, format: ImageFormat) -> bool {
        self.category == ContentCategory::Image(format)
    }
}

/// One row of a phase table.
struct Step {
    /// Optional tool that must be present for the step to be planned
    requires: Option<&'static str>,
    applies: fn(&PlanContext<'_>) -> bool,
    build: fn(&PlanContext<'_>) -> Vec<ToolInvocation>,
}

fn always(_: &PlanContext<'_>) -> bool {
    true
}

// ============================================================================
// Phase 1: Basic
// ============================================================================

const BASIC_STEPS: &[Step] = &[
    Step {
        requires: None,
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "file",
                OutputCategory::BasicAnalysis,
                CommandSpec::new("file").arg("-k").arg("--").arg(ctx.target),
            )]
        },
    },
    Step {
        requires: None,
        applies: always,
        build: |ctx| {
            vec![
                ToolInvocation::new(
                    "strings",
                    OutputCategory::BasicAnalysis,
                    CommandSpec::new("strings").args(["-a", "-n", "6"]).arg(ctx.target),
                ),
                ToolInvocation::new(
                    "strings_utf16le",
                    OutputCategory::BasicAnalysis,
                    CommandSpec::new("strings")
                        .args(["-a", "-e", "l", "-n", "6"])
                        .arg(ctx.target),
                ),
            ]
        },
    },
    Step {
        requires: None,
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "xxd",
                OutputCategory::BasicAnalysis,
                CommandSpec::new("xxd").args(["-l", HEX_PREVIEW_BYTES]).arg(ctx.target),
            )]
        },
    },
    Step {
        requires: None,
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "ent",
                OutputCategory::BasicAnalysis,
                CommandSpec::new("ent").arg(ctx.target),
            )]
        },
    },
];

// ============================================================================
// Phases 2 and 3: Metadata, Carving
// ============================================================================

const METADATA_STEPS: &[Step] = &[Step {
    requires: None,
    applies: always,
    build: |ctx| {
        vec![ToolInvocation::new(
            "exiftool",
            OutputCategory::Metadata,
            CommandSpec::new("exiftool").args(["-a", "-u", "-g1"]).arg(ctx.target),
        )]
    },
}];

const CARVING_STEPS: &[Step] = &[Step {
    requires: None,
    applies: always,
    build: |ctx| {
        let out = ctx.extracted("binwalk");
        vec![
            ToolInvocation::new(
                "binwalk",
                OutputCategory::Steganography,
                CommandSpec::new("binwalk")
                    .arg("-e")
                    .arg("-C")
                    .arg(&out)
                    .arg(ctx.target),
            )
            .create_dir(out),
        ]
    },
}];

// ============================================================================
// Phase 4: Image
// ============================================================================

fn convert_output(ctx: &PlanContext<'_>, file_name: &str) -> PathBuf {
    ctx.dir(OutputCategory::ImageAnalysis).join(file_name)
}

fn convert_steps(ctx: &PlanContext<'_>) -> Vec<ToolInvocation> {
    let convert = |args: &[&str], output: PathBuf| {
        CommandSpec::new("convert")
            .arg(ctx.target)
            .args(args.iter().copied())
            .arg(output)
    };

    let mut steps = vec![
        ToolInvocation::new(
            "convert_channels",
            OutputCategory::ImageAnalysis,
            convert(&["-separate"], convert_output(ctx, "channel_%d.png")),
        ),
        ToolInvocation::new(
            "convert_alpha",
            OutputCategory::ImageAnalysis,
            convert(&["-alpha", "extract"], convert_output(ctx, "alpha.png")),
        ),
        ToolInvocation::new(
            "convert_inverted",
            OutputCategory::ImageAnalysis,
            convert(&["-negate"], convert_output(ctx, "inverted.png")),
        ),
    ];

    for level in 0..THRESHOLD_LEVELS {
        let percent = level * 100 / THRESHOLD_LEVELS;
        let threshold = format!("{percent}%");
        steps.push(ToolInvocation::new(
            format!("convert_threshold_{percent:02}"),
            OutputCategory::ImageAnalysis,
            convert(
                &["-threshold", threshold.as_str()],
                convert_output(ctx, &format!("threshold_{percent:02}.png")),
            ),
        ));
    }

    steps
}

const IMAGE_STEPS: &[Step] = &[
    Step {
        requires: None,
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "steghide",
                OutputCategory::Steganography,
                CommandSpec::new("steghide")
                    .arg("info")
                    .arg(ctx.target)
                    .args(["-p", ""]),
            )]
        },
    },
    Step {
        requires: Some("exiv2"),
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "exiv2",
                OutputCategory::MetadataAdvanced,
                CommandSpec::new("exiv2").arg("-pa").arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("stegoveritas"),
        applies: always,
        build: |ctx| {
            let out = ctx.dir(OutputCategory::SteganographyAdvanced).join("stegoveritas");
            vec![
                ToolInvocation::new(
                    "stegoveritas",
                    OutputCategory::SteganographyAdvanced,
                    CommandSpec::new("stegoveritas")
                        .arg(ctx.target)
                        .arg("-out")
                        .arg(&out),
                )
                .create_dir(out),
            ]
        },
    },
    Step {
        requires: Some("convert"),
        applies: always,
        build: convert_steps,
    },
    // PNG
    Step {
        requires: Some("pngcheck"),
        applies: |ctx| ctx.is_format(ImageFormat::Png),
        build: |ctx| {
            vec![ToolInvocation::new(
                "pngcheck",
                OutputCategory::ImageAnalysis,
                CommandSpec::new("pngcheck").arg("-v").arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("zsteg"),
        applies: |ctx| ctx.is_format(ImageFormat::Png),
        build: |ctx| {
            vec![ToolInvocation::new(
                "zsteg",
                OutputCategory::Steganography,
                CommandSpec::new("zsteg").arg("-a").arg(ctx.target),
            )]
        },
    },
    // JPEG
    Step {
        requires: Some("jpeginfo"),
        applies: |ctx| ctx.is_format(ImageFormat::Jpeg),
        build: |ctx| {
            vec![ToolInvocation::new(
                "jpeginfo",
                OutputCategory::ImageAnalysis,
                CommandSpec::new("jpeginfo").arg("-c").arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("stegdetect"),
        applies: |ctx| ctx.is_format(ImageFormat::Jpeg),
        build: |ctx| {
            vec![ToolInvocation::new(
                "stegdetect",
                OutputCategory::Steganography,
                CommandSpec::new("stegdetect").arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("outguess"),
        applies: |ctx| ctx.is_format(ImageFormat::Jpeg),
        build: |ctx| {
            vec![ToolInvocation::new(
                "outguess",
                OutputCategory::Steganography,
                CommandSpec::new("outguess")
                    .arg("-r")
                    .arg(ctx.target)
                    .arg(ctx.extracted("outguess_output.bin")),
            )]
        },
    },
    Step {
        requires: None,
        applies: |ctx| ctx.is_format(ImageFormat::Jpeg),
        build: |ctx| {
            let pattern = ctx.extracted("%f_thumbnail.jpg");
            vec![ToolInvocation::new(
                "exiftool_thumbnail",
                OutputCategory::Metadata,
                CommandSpec::new("exiftool")
                    .args(["-b", "-ThumbnailImage", "-w"])
                    .arg(pattern)
                    .arg(ctx.target),
            )]
        },
    },
    // GIF
    Step {
        requires: Some("convert"),
        applies: |ctx| ctx.is_format(ImageFormat::Gif),
        build: |ctx| {
            let frames = ctx.dir(OutputCategory::ImageAnalysis).join("gif_frames");
            vec![
                ToolInvocation::new(
                    "convert_frames",
                    OutputCategory::ImageAnalysis,
                    CommandSpec::new("convert")
                        .arg(ctx.target)
                        .arg("-coalesce")
                        .arg(frames.join("frame_%03d.png")),
                )
                .create_dir(frames),
            ]
        },
    },
    Step {
        requires: Some("identify"),
        applies: |ctx| ctx.is_format(ImageFormat::Gif),
        build: |ctx| {
            vec![ToolInvocation::new(
                "identify",
                OutputCategory::ImageAnalysis,
                CommandSpec::new("identify").arg("-verbose").arg(ctx.target),
            )]
        },
    },
    // BMP
    Step {
        requires: Some("stegseek"),
        applies: |ctx| ctx.is_format(ImageFormat::Bmp) && ctx.wordlist.is_file(),
        build: |ctx| {
            vec![ToolInvocation::new(
                "stegseek",
                OutputCategory::Steganography,
                CommandSpec::new("stegseek")
                    .arg(ctx.target)
                    .arg(ctx.wordlist)
                    .arg(ctx.extracted("stegseek_output.bin")),
            )]
        },
    },
    Step {
        requires: Some("tesseract"),
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "tesseract",
                OutputCategory::ImageAnalysis,
                CommandSpec::new("tesseract")
                    .arg(ctx.target)
                    .arg(ctx.dir(OutputCategory::ImageAnalysis).join("ocr")),
            )]
        },
    },
];

// ============================================================================
// Phase 5: Audio/Video
// ============================================================================

fn media_category(ctx: &PlanContext<'_>) -> OutputCategory {
    if ctx.category == ContentCategory::Video {
        OutputCategory::VideoAnalysis
    } else {
        OutputCategory::AudioAnalysis
    }
}

fn is_audio(ctx: &PlanContext<'_>) -> bool {
    ctx.category == ContentCategory::Audio
}

fn is_video(ctx: &PlanContext<'_>) -> bool {
    ctx.category == ContentCategory::Video
}

fn ffmpeg(ctx: &PlanContext<'_>) -> CommandSpec {
    CommandSpec::new("ffmpeg")
        .args(["-y", "-hide_banner", "-i"])
        .arg(ctx.target)
}

const AUDIO_VIDEO_STEPS: &[Step] = &[
    Step {
        requires: None,
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "ffprobe",
                media_category(ctx),
                CommandSpec::new("ffprobe").arg("-hide_banner").arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("mediainfo"),
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "mediainfo",
                media_category(ctx),
                CommandSpec::new("mediainfo").arg(ctx.target),
            )]
        },
    },
    // Audio
    Step {
        requires: Some("sox"),
        applies: is_audio,
        build: |ctx| {
            vec![ToolInvocation::new(
                "sox_spectrogram",
                OutputCategory::AudioAnalysis,
                CommandSpec::new("sox")
                    .arg(ctx.target)
                    .args(["-n", "spectrogram", "-o"])
                    .arg(ctx.dir(OutputCategory::AudioAnalysis).join("spectrogram.png")),
            )]
        },
    },
    Step {
        requires: Some("stegolsb"),
        applies: is_audio,
        build: |ctx| {
            vec![ToolInvocation::new(
                "stegolsb",
                OutputCategory::Steganography,
                CommandSpec::new("stegolsb")
                    .args(["wavsteg", "-r", "-i"])
                    .arg(ctx.target)
                    .arg("-o")
                    .arg(ctx.extracted("stegolsb_output.bin"))
                    .args(["-n", "1", "-b", "10000"]),
            )]
        },
    },
    Step {
        requires: None,
        applies: is_audio,
        build: |ctx| {
            vec![ToolInvocation::new(
                "steghide_extract",
                OutputCategory::Steganography,
                CommandSpec::new("steghide")
                    .args(["extract", "-f", "-sf"])
                    .arg(ctx.target)
                    .arg("-xf")
                    .arg(ctx.extracted("steghide_extract.bin"))
                    .args(["-p", ""]),
            )]
        },
    },
    Step {
        requires: None,
        applies: is_audio,
        build: |ctx| {
            vec![ToolInvocation::new(
                "ffmpeg_waveform",
                OutputCategory::AudioAnalysis,
                ffmpeg(ctx)
                    .args(["-filter_complex", "showwavespic=s=1920x480", "-frames:v", "1"])
                    .arg(ctx.dir(OutputCategory::AudioAnalysis).join("waveform.png")),
            )]
        },
    },
    // Video
    Step {
        requires: None,
        applies: is_video,
        build: |ctx| {
            let frames = ctx.dir(OutputCategory::VideoAnalysis).join("frames");
            vec![
                ToolInvocation::new(
                    "ffmpeg_frames",
                    OutputCategory::VideoAnalysis,
                    ffmpeg(ctx)
                        .args(["-frames:v", VIDEO_FRAME_COUNT])
                        .arg(frames.join("frame_%03d.png")),
                )
                .create_dir(frames),
            ]
        },
    },
    Step {
        requires: None,
        applies: is_video,
        build: |ctx| {
            vec![ToolInvocation::new(
                "ffmpeg_audio",
                OutputCategory::VideoAnalysis,
                ffmpeg(ctx)
                    .args(["-vn", "-acodec", "copy"])
                    .arg(ctx.dir(OutputCategory::VideoAnalysis).join("audio_track.mka")),
            )]
        },
    },
    Step {
        requires: None,
        applies: is_video,
        build: |ctx| {
            vec![ToolInvocation::new(
                "ffprobe_streams",
                OutputCategory::VideoAnalysis,
                CommandSpec::new("ffprobe")
                    .args([
                        "-v",
                        "quiet",
                        "-print_format",
                        "json",
                        "-show_format",
                        "-show_streams",
                    ])
                    .arg(ctx.target),
            )]
        },
    },
    Step {
        requires: None,
        applies: is_video,
        build: |ctx| {
            vec![ToolInvocation::new(
                "ffmpeg_subtitles",
                OutputCategory::VideoAnalysis,
                ffmpeg(ctx)
                    .args(["-map", "0:s:0?"])
                    .arg(ctx.dir(OutputCategory::VideoAnalysis).join("subtitles.srt")),
            )]
        },
    },
];

// ============================================================================
// Phase 6: Advanced carving
// ============================================================================

const ADVANCED_CARVING_STEPS: &[Step] = &[
    Step {
        requires: Some("foremost"),
        applies: always,
        build: |ctx| {
            let out = ctx.extracted("foremost");
            vec![
                ToolInvocation::new(
                    "foremost",
                    OutputCategory::Extracted,
                    CommandSpec::new("foremost")
                        .arg("-i")
                        .arg(ctx.target)
                        .arg("-o")
                        .arg(&out),
                )
                .create_dir(out),
            ]
        },
    },
    // scalpel and bulk_extractor refuse to write into an existing directory
    Step {
        requires: Some("scalpel"),
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "scalpel",
                OutputCategory::Extracted,
                CommandSpec::new("scalpel")
                    .arg("-o")
                    .arg(ctx.extracted("scalpel"))
                    .arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("bulk_extractor"),
        applies: always,
        build: |ctx| {
            vec![ToolInvocation::new(
                "bulk_extractor",
                OutputCategory::Extracted,
                CommandSpec::new("bulk_extractor")
                    .arg("-o")
                    .arg(ctx.extracted("bulk_extractor"))
                    .arg(ctx.target),
            )]
        },
    },
    Step {
        requires: Some("vol"),
        applies: |ctx| ctx.category == ContentCategory::Generic,
        build: |ctx| {
            vec![ToolInvocation::new(
                "volatility",
                OutputCategory::BasicAnalysis,
                CommandSpec::new("vol")
                    .arg("-f")
                    .arg(ctx.target)
                    .arg("windows.info"),
            )
            .probe("vol")]
        },
    },
];

fn steps_for(phase: PhaseId) -> &'static [Step] {
    match phase {
        PhaseId::Basic => BASIC_STEPS,
        PhaseId::Metadata => METADATA_STEPS,
        PhaseId::Carving => CARVING_STEPS,
        PhaseId::Image => IMAGE_STEPS,
        PhaseId::AudioVideo => AUDIO_VIDEO_STEPS,
        PhaseId::AdvancedCarving => ADVANCED_CARVING_STEPS,
    }
}

/// Whether `phase` applies to this content and host at all.
#[must_use]
pub fn phase_applies(phase: PhaseId, category: ContentCategory, probe: &dyn ToolProbe) -> bool {
    match phase {
        PhaseId::Basic | PhaseId::Metadata | PhaseId::Carving => true,
        PhaseId::Image => category.is_image(),
        PhaseId::AudioVideo => category.is_audio_or_video(),
        PhaseId::AdvancedCarving => CARVING_ENGINES.iter().any(|tool| probe.is_available(tool)),
    }
}

/// Invocations for `phase`, in execution order. Empty when the gate is closed.
#[must_use]
pub fn plan_phase(phase: PhaseId, ctx: &PlanContext<'_>) -> Vec<ToolInvocation> {
    if !phase_applies(phase, ctx.category, ctx.probe) {
        return Vec::new();
    }

    steps_for(phase)
        .iter()
        .filter(|step| step.requires.is_none_or(|tool| ctx.has(tool)))
        .filter(|step| (step.applies)(ctx))
        .flat_map(|step| (step.build)(ctx))
        .collect()
}

// ============================================================================
// Executor
// ============================================================================

/// What to do after the operator interrupts a running tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptDecision {
    /// Skip to the next step of the phase
    Continue,
    /// Run the current phase again from its first step
    Restart,
    /// Abandon the run
    Quit,
}

/// Decides how an interrupted tool affects the rest of the phase.
pub trait InterruptPolicy {
    fn on_interrupt(&mut self, phase: PhaseId, tool: &str) -> InterruptDecision;
}

/// Non-interactive policy: any interrupt ends the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuitOnInterrupt;

impl InterruptPolicy for QuitOnInterrupt {
    fn on_interrupt(&mut self, _phase: PhaseId, _tool: &str) -> InterruptDecision {
        InterruptDecision::Quit
    }
}

/// Reports of one phase execution.
#[derive(Debug, Clone, Default)]
pub struct PhaseOutcome {
    pub applicable: bool,
    pub reports: Vec<ToolReport>,
}

impl Engine {
    /// Plan `phase` for this run without executing it.
    #[must_use]
    pub fn plan(&self, run: &AnalysisRun, phase: PhaseId) -> Vec<ToolInvocation> {
        let target = option_safe_path(run.input());
        let wordlist = option_safe_path(&self.config().defaults.wordlist);
        let ctx = PlanContext {
            target: &target,
            category: run.category(),
            probe: self.probe(),
            workspace: run.workspace(),
            wordlist: &wordlist,
        };
        plan_phase(phase, &ctx)
    }

    /// Execute one phase. Tool failures never abort it; malformed steps and
    /// artifact write failures are logged and the step is skipped.
    pub fn run_phase(
        &self,
        run: &mut AnalysisRun,
        phase: PhaseId,
        interrupts: &mut dyn InterruptPolicy,
    ) -> Result<PhaseOutcome, StegError> {
        if self.console() {
            logging::print_phase_banner(phase.title());
        }

        'phase: loop {
            let plan = self.plan(run, phase);
            if plan.is_empty() {
                run.workspace().log().info(format!(
                    "Phase {} ({}) not applicable to {} content",
                    phase.number(),
                    phase.title(),
                    run.category()
                ));
                return Ok(PhaseOutcome::default());
            }

            run.workspace().log().info(format!(
                "Phase {} ({}): {} step(s)",
                phase.number(),
                phase.title(),
                plan.len()
            ));

            let mut outcome = PhaseOutcome {
                applicable: true,
                reports: Vec::with_capacity(plan.len()),
            };

            for invocation in &plan {
                match self.run_tool(run, invocation) {
                    Ok(report) if report.status == ToolStatus::Interrupted => {
                        outcome.reports.push(report);
                        match interrupts.on_interrupt(phase, &invocation.name) {
                            InterruptDecision::Continue => {
                                run.workspace()
                                    .log()
                                    .warn(format!("{} interrupted; continuing", invocation.name));
                            }
                            InterruptDecision::Restart => {
                                run.workspace()
                                    .log()
                                    .warn(format!("Restarting phase {}", phase.title()));
                                continue 'phase;
                            }
                            InterruptDecision::Quit => {
                                run.workspace().log().warn("Analysis interrupted by operator");
                                return Err(StegError::Interrupted);
                            }
                        }
                    }
                    Ok(report) => outcome.reports.push(report),
                    Err(err @ (StegError::Invocation(_) | StegError::Workspace(_))) => {
                        run.workspace()
                            .log()
                            .error(format!("Step {} skipped: {err}", invocation.name));
                    }
                    Err(err) => return Err(err),
                }
            }

            return Ok(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{OPTIONAL_TOOLS, REQUIRED_TOOLS};
    use crate::test_support::{ScriptedRunner, StaticProbe, TestRig};

    fn names(plan: &[ToolInvocation]) -> Vec<&str> {
        plan.iter().map(|inv| inv.name.as_str()).collect()
    }

    fn all_tools() -> Vec<&'static str> {
        REQUIRED_TOOLS.iter().chain(OPTIONAL_TOOLS).copied().collect()
    }

    #[test]
    fn test_basic_phase_plan() {
        let rig = TestRig::new(ContentCategory::Generic, &all_tools());
        let run = rig.start_run();
        let plan = rig.engine.plan(&run, PhaseId::Basic);

        assert_eq!(names(&plan), vec!["file", "strings", "strings_utf16le", "xxd", "ent"]);
        let xxd = &plan[3];
        assert_eq!(xxd.category, OutputCategory::BasicAnalysis);
        assert!(xxd.command.display().contains("-l 1024"));
    }

    #[test]
    fn test_image_phase_gated_on_category() {
        let rig = TestRig::new(ContentCategory::Audio, &all_tools());
        let run = rig.start_run();
        assert!(rig.engine.plan(&run, PhaseId::Image).is_empty());

        let av = rig.engine.plan(&run, PhaseId::AudioVideo);
        let av_names = names(&av);
        assert_eq!(av_names[0], "ffprobe");
        assert!(av_names.contains(&"sox_spectrogram"));
        assert!(av_names.contains(&"steghide_extract"));
        assert!(!av_names.contains(&"ffmpeg_frames"));
    }

    #[test]
    fn test_png_branch_and_optional_tools() {
        let rig = TestRig::new(ContentCategory::Image(ImageFormat::Png), &REQUIRED_TOOLS.to_vec());
        let run = rig.start_run();
        let plan = rig.engine.plan(&run, PhaseId::Image);
        let plan_names = names(&plan);

        assert_eq!(plan_names[0], "steghide");
        assert!(plan_names.contains(&"convert_channels"));
        assert_eq!(
            plan_names
                .iter()
                .filter(|n| n.starts_with("convert_threshold_"))
                .count(),
            THRESHOLD_LEVELS as usize
        );
        // zsteg and pngcheck are optional and absent
        assert!(!plan_names.contains(&"zsteg"));
        assert!(!plan_names.contains(&"pngcheck"));
        assert!(!plan_names.contains(&"jpeginfo"));
        assert!(!plan_names.contains(&"exiv2"));
    }

    #[test]
    fn test_jpeg_branch_with_optional_tools() {
        let rig = TestRig::new(ContentCategory::Image(ImageFormat::Jpeg), &all_tools());
        let run = rig.start_run();
        let plan_names: Vec<String> = rig
            .engine
            .plan(&run, PhaseId::Image)
            .into_iter()
            .map(|inv| inv.name)
            .collect();

        for expected in ["jpeginfo", "stegdetect", "outguess", "exiftool_thumbnail", "exiv2", "tesseract"] {
            assert!(plan_names.iter().any(|n| n == expected), "{expected} missing");
        }
        assert!(!plan_names.iter().any(|n| n == "zsteg"));
        assert_eq!(plan_names.last().map(String::as_str), Some("tesseract"));
    }

    #[test]
    fn test_advanced_carving_gate() {
        let without = TestRig::new(ContentCategory::Generic, &REQUIRED_TOOLS.to_vec());
        let run = without.start_run();
        assert!(without.engine.plan(&run, PhaseId::AdvancedCarving).is_empty());

        let probe = StaticProbe::with(&["foremost"]);
        assert!(phase_applies(PhaseId::AdvancedCarving, ContentCategory::Generic, &probe));

        let with = TestRig::new(ContentCategory::Generic, &["foremost", "vol"]);
        let run = with.start_run();
        assert_eq!(
            names(&with.engine.plan(&run, PhaseId::AdvancedCarving)),
            vec!["foremost", "volatility"]
        );
    }

    #[test]
    fn test_planning_is_deterministic() {
        let rig = TestRig::new(ContentCategory::Video, &all_tools());
        let run = rig.start_run();
        let first: Vec<String> = rig
            .engine
            .plan(&run, PhaseId::AudioVideo)
            .iter()
            .map(|inv| inv.command.display())
            .collect();
        let second: Vec<String> = rig
            .engine
            .plan(&run, PhaseId::AudioVideo)
            .iter()
            .map(|inv| inv.command.display())
            .collect();
        assert_eq!(first, second);
        assert!(first.iter().any(|c| c.contains("-frames:v 10")));
    }

    #[test]
    fn test_tool_failures_do_not_abort_phase() {
        let rig = TestRig::new(ContentCategory::Generic, &REQUIRED_TOOLS.to_vec());
        rig.runner.script("file", ScriptedRunner::output(2, "boom\n"));
        rig.runner.script("strings", ScriptedRunner::timeout("partial\n"));
        let mut run = rig.start_run();

        let outcome = rig
            .engine
            .run_phase(&mut run, PhaseId::Basic, &mut QuitOnInterrupt)
            .unwrap();

        assert_eq!(outcome.reports.len(), 5);
        assert_eq!(outcome.reports[0].status, ToolStatus::Error);
        assert_eq!(outcome.reports[1].status, ToolStatus::Timeout);
        assert_eq!(outcome.reports[4].status, ToolStatus::Success);
        assert_eq!(run.counters().errors(), 1);
        assert_eq!(run.counters().timeouts(), 2);
    }

    struct Decide(Vec<InterruptDecision>);

    impl InterruptPolicy for Decide {
        fn on_interrupt(&mut self, _phase: PhaseId, _tool: &str) -> InterruptDecision {
            self.0.remove(0)
        }
    }

    #[test]
    fn test_interrupt_continue_restart_quit() {
        let rig = TestRig::new(ContentCategory::Generic, &REQUIRED_TOOLS.to_vec());
        let mut run = rig.start_run();

        rig.runner.script("xxd", ScriptedRunner::interrupted());
        rig.runner.script("xxd", ScriptedRunner::output(0, "00000000: 4142\n"));
        let outcome = rig
            .engine
            .run_phase(
                &mut run,
                PhaseId::Basic,
                &mut Decide(vec![InterruptDecision::Continue]),
            )
            .unwrap();
        assert_eq!(outcome.reports.len(), 5);
        assert_eq!(outcome.reports[3].status, ToolStatus::Interrupted);

        rig.runner.script("exiftool", ScriptedRunner::interrupted());
        rig.runner.script("exiftool", ScriptedRunner::output(0, "ok\n"));
        let outcome = rig
            .engine
            .run_phase(
                &mut run,
                PhaseId::Metadata,
                &mut Decide(vec![InterruptDecision::Restart]),
            )
            .unwrap();
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].status, ToolStatus::Success);

        rig.runner.script("binwalk", ScriptedRunner::interrupted());
        let err = rig
            .engine
            .run_phase(&mut run, PhaseId::Carving, &mut QuitOnInterrupt)
            .unwrap_err();
        assert!(matches!(err, StegError::Interrupted));
    }
}
