//! Rendering of scan results and job progress

use std::str::FromStr;

use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::model::ScanResult;

pub mod progress;

pub use progress::{
    ConsoleProgressReporter, JsonProgressReporter, NoOpProgressReporter, ProgressReporter,
};

/// Output format of the scan report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl FromStr for ReportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "yaml" => Ok(ReportFormat::Yaml),
            other => Err(DomainError::BadArgs(format!(
                "Unknown report format '{}'. Valid formats: text, json, yaml",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanReport<'a> {
    folder: &'a str,
    #[serde(flatten)]
    scan: &'a ScanResult,
}

/// Render a scan result for `folder`
pub fn format_scan(
    folder: &str,
    scan: &ScanResult,
    format: ReportFormat,
) -> Result<String, DomainError> {
    let report = ScanReport { folder, scan };
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(&report)
            .map_err(|e| DomainError::InternalError(format!("JSON serialization failed: {}", e))),
        ReportFormat::Yaml => serde_yaml::to_string(&report)
            .map_err(|e| DomainError::InternalError(format!("YAML serialization failed: {}", e))),
        ReportFormat::Text => Ok(format_scan_text(folder, scan)),
    }
}

fn format_scan_text(folder: &str, scan: &ScanResult) -> String {
    let mut output = String::new();

    output.push_str("Scan Result:\n");
    output.push_str(&format!("  Folder: {}\n", folder));
    output.push_str(&format!("  First File: {}\n", scan.first_file));

    output.push_str(&format!("\nChapters ({}):\n", scan.chapters.len()));
    if scan.chapters.is_empty() {
        output.push_str("  (none)\n");
    }
    for (label, offset) in scan.chapters.iter() {
        output.push_str(&format!("  {:<12} {:>10.3}\n", label, offset));
    }

    output.push_str(&format!("\nAudio Tracks ({}):\n", scan.audio_tracks.len()));
    if scan.audio_tracks.is_empty() {
        output.push_str("  (none)\n");
    }
    for track in &scan.audio_tracks {
        output.push_str(&format!("  {}\n", track.display_label()));
    }

    output
}
