//! Command-line argument definitions

use clap::Args;

use crate::domain::model::SkipRange;
use crate::domain::rules::PartsInput;
use crate::output::ReportFormat;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Input folder path
    #[arg(short, long)]
    pub input: String,

    /// Report format (text, json, yaml)
    #[arg(long, default_value = "text", value_parser = parse_report_format)]
    pub format: ReportFormat,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input folder path
    #[arg(short, long)]
    pub input: String,

    /// Output folder path
    #[arg(short, long)]
    pub output: String,

    /// Chapter range to cut out, as START..END (either side may be empty;
    /// splits at the last "..", so only START may contain "..")
    #[arg(long = "skip", value_name = "START..END", value_parser = parse_skip_range)]
    pub skips: Vec<SkipRange>,

    /// Number of parts to split each episode into
    #[arg(long, default_value = "1", value_parser = parse_parts)]
    pub parts: u32,

    /// Audio stream index to keep (default: first scanned track)
    #[arg(long)]
    pub audio: Option<u32>,

    /// Emit progress as JSON lines
    #[arg(long)]
    pub json_progress: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the raw snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Parse `START..END`, `START..` or `..END` into a skip range
///
/// Splits at the last `..`, so a START label may itself contain `..`.
pub fn parse_skip_range(value: &str) -> Result<SkipRange, String> {
    match value.rsplit_once("..") {
        Some((start, end)) => Ok(SkipRange::new(start.trim(), end.trim())),
        None => Err(format!(
            "expected START..END with chapter labels, got '{}'",
            value
        )),
    }
}

/// Parse the part count; anything but a whole number >= 1 is rejected
pub fn parse_parts(value: &str) -> Result<u32, String> {
    PartsInput::parse(value).map_err(|e| e.to_string())
}

fn parse_report_format(value: &str) -> Result<ReportFormat, String> {
    value.parse::<ReportFormat>().map_err(|e| e.to_string())
}
