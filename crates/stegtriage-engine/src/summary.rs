//! Run summary
//!
//! Advisory only. Heuristics here point the analyst at artifacts worth reading;
//! they never decide whether a file contains hidden data.

use chrono::Local;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use crate::artifact::{body_text, latest_body};
use crate::run::{AnalysisRun, RunCounters};
use crate::workspace::{ARTIFACT_SUFFIX, OutputCategory, list_files};

/// Entropy above this (bits per byte) suggests compressed or encrypted content.
pub const HIGH_ENTROPY_THRESHOLD: f64 = 7.5;

/// Case-insensitive words in stego tool output that merit a closer look.
pub const POSITIVE_MARKERS: &[&str] = &["found", "detected", "extracted"];

static ENTROPY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Entropy\s*=\s*([0-9]+(?:\.[0-9]+)?)\s*bits per byte").unwrap());

const RECOMMENDATIONS: &[&str] = &[
    "Review every file under Extracted/ with a hex viewer before opening it",
    "Compare the channel and threshold images in Image Analysis/ for visual anomalies",
    "Inspect Metadata/ for unusual comments, software tags or embedded thumbnails",
    "Check the spectrogram in Audio Analysis/ for text or patterns",
    "Re-run password-protected extractions with case-specific wordlists",
    "Treat all findings as leads; confirm them manually before reporting",
];

/// Figures derived from a workspace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryFindings {
    /// Regular files in the workspace, the summary itself excluded
    pub total_files: usize,
    /// Latest `ent` measurement, if any
    pub entropy: Option<f64>,
    pub high_entropy: bool,
    pub extracted_files: usize,
    /// Steganography transcripts whose tool output contains a positive marker
    pub stego_hits: Vec<String>,
}

/// Parse `Entropy = 7.91 bits per byte.` out of `ent` output.
#[must_use]
pub fn parse_entropy(text: &str) -> Option<f64> {
    ENTROPY_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn contains_marker(body: &str) -> bool {
    let lower = body.to_lowercase();
    POSITIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn file_stem(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.strip_suffix(ARTIFACT_SUFFIX).map(str::to_string))
        .unwrap_or_default()
}

/// Scan the workspace of `run`.
#[must_use]
pub fn collect_findings(run: &AnalysisRun) -> SummaryFindings {
    let workspace = run.workspace();
    let summary_path = workspace.summary_path();

    let total_files = list_files(workspace.root())
        .into_iter()
        .filter(|path| *path != summary_path)
        .count();

    let entropy = fs::read_to_string(workspace.artifact_path(OutputCategory::BasicAnalysis, "ent"))
        .ok()
        .and_then(|text| latest_body(&text))
        .and_then(|body| parse_entropy(&body));

    let extracted_files = list_files(&workspace.dir(OutputCategory::Extracted)).len();

    let stego_hits = list_files(&workspace.dir(OutputCategory::Steganography))
        .into_iter()
        .filter(|path| path.to_string_lossy().ends_with(ARTIFACT_SUFFIX))
        .filter(|path| {
            fs::read_to_string(path)
                .map(|text| contains_marker(&body_text(&text)))
                .unwrap_or(false)
        })
        .map(|path| file_stem(&path))
        .collect();

    SummaryFindings {
        total_files,
        entropy,
        high_entropy: entropy.is_some_and(|e| e > HIGH_ENTROPY_THRESHOLD),
        extracted_files,
        stego_hits,
    }
}

fn tally_lines(counters: &RunCounters) -> String {
    format!(
        "  Tools run: {}\n  Succeeded: {}\n  Warnings: {}\n  Errors: {}\n  Timeouts: {}\n  Skipped (not installed): {}\n  Interrupted: {}\n",
        counters.total(),
        counters.successes(),
        counters.warnings(),
        counters.errors(),
        counters.timeouts(),
        counters.skipped(),
        counters.interrupted()
    )
}

/// Render one summary block.
#[must_use]
pub fn render_summary(run: &AnalysisRun, findings: &SummaryFindings) -> String {
    let mut out = String::new();
    out.push_str("==============================================\n");
    out.push_str(&format!(
        "Analysis summary ({})\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str("==============================================\n");
    out.push_str(&format!("Input: {}\n", run.input().display()));
    out.push_str(&format!("MIME type: {}\n", run.mime()));
    out.push_str(&format!("Category: {}\n", run.category()));
    out.push_str(&format!("Workspace: {}\n\n", run.workspace().root().display()));

    out.push_str("Invocations:\n");
    out.push_str(&tally_lines(run.counters()));
    out.push_str(&format!("\nOutput files: {}\n", findings.total_files));

    match findings.entropy {
        Some(entropy) if findings.high_entropy => out.push_str(&format!(
            "Entropy: {entropy:.4} bits per byte\n  ADVISORY: entropy above {HIGH_ENTROPY_THRESHOLD} may indicate compressed, encrypted or hidden data\n"
        )),
        Some(entropy) => out.push_str(&format!("Entropy: {entropy:.4} bits per byte\n")),
        None => out.push_str("Entropy: not measured\n"),
    }

    out.push_str(&format!("Extracted files: {}\n", findings.extracted_files));
    if findings.stego_hits.is_empty() {
        out.push_str("Steganography tools reporting results: none\n");
    } else {
        out.push_str(&format!(
            "Steganography tools reporting results: {} ({})\n",
            findings.stego_hits.len(),
            findings.stego_hits.join(", ")
        ));
    }

    out.push_str("\nRecommended manual review:\n");
    for line in RECOMMENDATIONS {
        out.push_str(&format!("  - {line}\n"));
    }
    out.push('\n');
    out
}

/// Append a summary block to `analysis_summary.txt`.
///
/// Failures are logged; the run always continues.
pub fn generate_summary(run: &AnalysisRun) -> SummaryFindings {
    let findings = collect_findings(run);
    let text = render_summary(run, &findings);

    let log = run.workspace().log();
    match run.workspace().append_summary(&text) {
        Ok(()) => log.info(format!(
            "Summary written to {}",
            run.workspace().summary_path().display()
        )),
        Err(e) => log.error(format!("Could not write summary: {e}")),
    }
    if findings.high_entropy {
        log.warn("High entropy detected; see summary");
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ToolInvocation;
    use crate::test_support::{ScriptedRunner, TestRig};
    use stegtriage_runner::CommandSpec;
    use stegtriage_utils::types::ContentCategory;

    #[test]
    fn test_parse_entropy() {
        let ent = "Entropy = 7.912345 bits per byte.\n\nOptimum compression would reduce the size\n";
        assert_eq!(parse_entropy(ent), Some(7.912_345));
        assert_eq!(parse_entropy("Entropy=6 bits per byte"), Some(6.0));
        assert_eq!(parse_entropy("no measurement"), None);
    }

    fn run_ent(rig: &TestRig, run: &mut AnalysisRun) {
        let inv = ToolInvocation::new(
            "ent",
            OutputCategory::BasicAnalysis,
            CommandSpec::new("ent").arg(run.input()),
        );
        rig.engine.run_tool(run, &inv).unwrap();
    }

    #[test]
    fn test_high_entropy_advisory() {
        let rig = TestRig::new(ContentCategory::Generic, &["ent"]);
        rig.runner
            .script("ent", ScriptedRunner::output(0, "Entropy = 7.91 bits per byte.\n"));
        let mut run = rig.start_run();
        run_ent(&rig, &mut run);

        let findings = generate_summary(&run);
        assert!(findings.high_entropy);
        let summary = fs::read_to_string(run.workspace().summary_path()).unwrap();
        assert!(summary.contains("ADVISORY"));
        assert!(summary.contains("Recommended manual review"));
    }

    #[test]
    fn test_low_entropy_has_no_advisory() {
        let rig = TestRig::new(ContentCategory::Generic, &["ent"]);
        rig.runner
            .script("ent", ScriptedRunner::output(0, "Entropy = 6.20 bits per byte.\n"));
        let mut run = rig.start_run();
        run_ent(&rig, &mut run);

        let findings = generate_summary(&run);
        assert_eq!(findings.entropy, Some(6.2));
        assert!(!findings.high_entropy);
        let summary = fs::read_to_string(run.workspace().summary_path()).unwrap();
        assert!(!summary.contains("ADVISORY"));
    }

    #[test]
    fn test_stego_hits_ignore_headers() {
        let rig = TestRig::new(ContentCategory::Generic, &["binwalk", "zsteg"]);
        rig.runner
            .script("binwalk", ScriptedRunner::output(0, "DECIMAL  HEXADECIMAL\n"));
        rig.runner
            .script("zsteg", ScriptedRunner::output(0, "b1,rgb,lsb,xy .. text detected\n"));
        let mut run = rig.start_run();

        // The binwalk header mentions Extracted/binwalk; its body is clean
        let extracted = run.workspace().dir(OutputCategory::Extracted).join("binwalk");
        let binwalk = ToolInvocation::new(
            "binwalk",
            OutputCategory::Steganography,
            CommandSpec::new("binwalk").arg("-e").arg("-C").arg(&extracted).arg(run.input()),
        )
        .create_dir(extracted);
        let zsteg = ToolInvocation::new(
            "zsteg",
            OutputCategory::Steganography,
            CommandSpec::new("zsteg").arg("-a").arg(run.input()),
        );
        rig.engine.run_tool(&mut run, &binwalk).unwrap();
        rig.engine.run_tool(&mut run, &zsteg).unwrap();

        let findings = collect_findings(&run);
        assert_eq!(findings.stego_hits, vec!["zsteg".to_string()]);
        assert_eq!(findings.extracted_files, 0);
    }

    #[test]
    fn test_summary_appends() {
        let rig = TestRig::new(ContentCategory::Generic, &[]);
        let run = rig.start_run();

        generate_summary(&run);
        let first = fs::read_to_string(run.workspace().summary_path()).unwrap();
        generate_summary(&run);
        let second = fs::read_to_string(run.workspace().summary_path()).unwrap();

        assert!(second.starts_with(&first));
        assert_eq!(second.matches("Analysis summary").count(), 2);
    }
}
