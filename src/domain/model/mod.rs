// Domain models - Core types and data structures

use std::fmt;
use std::str::FromStr;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, ErrorKind};

/// Ordered chapter markers of the scanned file: label -> offset
///
/// Labels are unique. Scan order is kept so chapters list the way the
/// service returned them; order carries no other meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterSet {
    entries: Vec<(String, f64)>,
}

impl ChapterSet {
    /// Create an empty chapter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chapter, replacing the offset in place if the label exists
    pub fn insert(&mut self, label: impl Into<String>, offset: f64) {
        let label = label.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = offset,
            None => self.entries.push((label, offset)),
        }
    }

    /// Chapter labels in scan order
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.clone()).collect()
    }

    /// Offset recorded for a label
    pub fn offset(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, offset)| *offset)
    }

    /// Check whether a label exists
    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (label, offset) pairs in scan order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(label, offset)| (label.as_str(), *offset))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ChapterSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut chapters = ChapterSet::new();
        for (label, offset) in iter {
            chapters.insert(label, offset);
        }
        chapters
    }
}

impl Serialize for ChapterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, offset) in &self.entries {
            map.serialize_entry(label, offset)?;
        }
        map.end()
    }
}

struct ChapterSetVisitor;

impl<'de> Visitor<'de> for ChapterSetVisitor {
    type Value = ChapterSet;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of chapter labels to numeric offsets")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut chapters = ChapterSet::new();
        while let Some((label, offset)) = access.next_entry::<String, f64>()? {
            chapters.insert(label, offset);
        }
        Ok(chapters)
    }
}

impl<'de> Deserialize<'de> for ChapterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ChapterSetVisitor)
    }
}

/// Audio stream of the scanned file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Stream index assigned by the container (not necessarily contiguous)
    pub index: u32,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub title: String,
}

impl AudioTrack {
    pub fn new(index: u32, lang: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            index,
            lang: lang.into(),
            title: title.into(),
        }
    }

    /// Language for display, "Unknown" when the stream has no tag
    pub fn language(&self) -> &str {
        if self.lang.is_empty() {
            "Unknown"
        } else {
            &self.lang
        }
    }

    /// Selector label, e.g. `#1 — jpn (Commentary)`
    pub fn display_label(&self) -> String {
        if self.title.is_empty() {
            format!("#{} — {}", self.index, self.language())
        } else {
            format!("#{} — {} ({})", self.index, self.language(), self.title)
        }
    }
}

/// Result of inspecting the representative file of a folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapters: ChapterSet,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_tracks: Vec<AudioTrack>,
    pub first_file: String,
}

impl ScanResult {
    /// Chapter labels in scan order
    pub fn chapter_labels(&self) -> Vec<String> {
        self.chapters.labels()
    }

    /// Check whether a track with this stream index exists
    pub fn has_audio_track(&self, index: u32) -> bool {
        self.audio_tracks.iter().any(|track| track.index == index)
    }

    /// Index of the first listed audio track
    pub fn first_audio_index(&self) -> Option<u32> {
        self.audio_tracks.first().map(|track| track.index)
    }
}

// The service encodes empty collections as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which end of a skip range is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipRangeField {
    Start,
    End,
}

impl FromStr for SkipRangeField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(SkipRangeField::Start),
            "end" => Ok(SkipRangeField::End),
            other => Err(DomainError::BadArgs(format!(
                "Invalid skip range field: {}. Valid fields: start, end",
                other
            ))),
        }
    }
}

impl fmt::Display for SkipRangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipRangeField::Start => write!(f, "start"),
            SkipRangeField::End => write!(f, "end"),
        }
    }
}

/// Interval to excise, bounded by two chapter labels
///
/// Labels are free-form; they are not checked against the chapter set and
/// either one may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRange {
    pub start: String,
    pub end: String,
}

impl SkipRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Label held by one end of the range
    pub fn get(&self, field: SkipRangeField) -> &str {
        match field {
            SkipRangeField::Start => &self.start,
            SkipRangeField::End => &self.end,
        }
    }

    fn set(&mut self, field: SkipRangeField, value: String) {
        match field {
            SkipRangeField::Start => self.start = value,
            SkipRangeField::End => self.end = value,
        }
    }
}

/// Trim options assembled during a session
///
/// Every operation returns a new value; the receiver is left untouched.
/// Skip range positions shift after a removal, so callers re-resolve
/// indices after any mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimConfiguration {
    skip_ranges: Vec<SkipRange>,
    parts: u32,
    audio_index: u32,
}

impl Default for TrimConfiguration {
    fn default() -> Self {
        Self {
            skip_ranges: Vec::new(),
            parts: 1,
            audio_index: 0,
        }
    }
}

impl TrimConfiguration {
    /// Fresh configuration: no ranges, one part, audio index 0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_ranges(&self) -> &[SkipRange] {
        &self.skip_ranges
    }

    pub fn parts(&self) -> u32 {
        self.parts
    }

    pub fn audio_index(&self) -> u32 {
        self.audio_index
    }

    /// Append an empty range at the end
    pub fn add_skip_range(&self) -> Self {
        let mut next = self.clone();
        next.skip_ranges.push(SkipRange::default());
        next
    }

    /// Replace one field of the range at `index`
    pub fn update_skip_range(
        &self,
        index: usize,
        field: SkipRangeField,
        value: impl Into<String>,
    ) -> Result<Self, DomainError> {
        self.check_index(index)?;
        let mut next = self.clone();
        next.skip_ranges[index].set(field, value.into());
        Ok(next)
    }

    /// Remove the range at `index`, shifting later ranges down by one
    pub fn remove_skip_range(&self, index: usize) -> Result<Self, DomainError> {
        self.check_index(index)?;
        let mut next = self.clone();
        next.skip_ranges.remove(index);
        Ok(next)
    }

    /// Set the number of output parts
    pub fn set_parts(&self, parts: i64) -> Result<Self, DomainError> {
        let parts = u32::try_from(parts)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| DomainError::InvalidPartCount(parts.to_string()))?;
        let mut next = self.clone();
        next.parts = parts;
        Ok(next)
    }

    /// Select the audio track by stream index (not validated here)
    pub fn set_audio_index(&self, index: u32) -> Self {
        let mut next = self.clone();
        next.audio_index = index;
        next
    }

    fn check_index(&self, index: usize) -> Result<(), DomainError> {
        if index >= self.skip_ranges.len() {
            return Err(DomainError::IndexOutOfRange {
                index,
                len: self.skip_ranges.len(),
            });
        }
        Ok(())
    }
}

/// Body of a job submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRequest {
    pub input: String,
    pub output: String,
    pub options: TrimConfiguration,
}

/// Acknowledgment returned when the service accepts a job
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionAck {
    pub response: serde_json::Value,
}

impl SubmissionAck {
    pub fn new(response: serde_json::Value) -> Self {
        Self { response }
    }

    /// `status` field of the acknowledgment, if the service sent one
    pub fn status(&self) -> Option<&str> {
        self.response.get("status").and_then(|s| s.as_str())
    }
}

/// One status report of the running job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Free-form description of the current phase
    pub status: String,
    pub completed: u64,
    pub total: u64,
    pub percent: f64,
    pub done: bool,
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} ({}%)",
            self.status, self.completed, self.total, self.percent
        )
    }
}

/// Workflow state of a trim session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Scanning,
    Configuring,
    Submitting,
    Polling,
    /// A remote operation failed; held until acknowledged
    Error(ErrorKind),
}

impl SessionState {
    /// A request to the service is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Scanning | SessionState::Submitting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Scanning => write!(f, "scanning"),
            SessionState::Configuring => write!(f, "configuring"),
            SessionState::Submitting => write!(f, "submitting"),
            SessionState::Polling => write!(f, "polling"),
            SessionState::Error(kind) => write!(f, "in {} error", kind),
        }
    }
}

/// Configuration reference invalidated by a new scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReference {
    /// Skip range label no longer among the chapters; cleared
    RangeLabel {
        range: usize,
        field: SkipRangeField,
        label: String,
    },
    /// Selected audio track no longer exists; replaced
    AudioIndex { previous: u32, replacement: u32 },
}

impl fmt::Display for StaleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReference::RangeLabel { range, field, label } => write!(
                f,
                "skip range #{} {} '{}' is not a chapter of the new scan",
                range + 1,
                field,
                label
            ),
            StaleReference::AudioIndex {
                previous,
                replacement,
            } => write!(
                f,
                "audio track #{} is gone, selected #{} instead",
                previous, replacement
            ),
        }
    }
}

/// User-facing notification raised by the session
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ScanFailed(String),
    SubmissionFailed(String),
    PollFailed(String),
    PollingAbandoned { consecutive_failures: u32 },
    StaleReferencesCleared(Vec<StaleReference>),
    JobFinished,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ScanFailed(reason) => write!(f, "Error scanning folder: {}", reason),
            Notice::SubmissionFailed(reason) => {
                write!(f, "Error starting trim process: {}", reason)
            }
            Notice::PollFailed(reason) => write!(f, "Error reading job status: {}", reason),
            Notice::PollingAbandoned {
                consecutive_failures,
            } => write!(
                f,
                "Stopped following the job after {} failed status queries",
                consecutive_failures
            ),
            Notice::StaleReferencesCleared(references) => {
                write!(f, "Configuration updated for the new scan: ")?;
                let parts: Vec<String> = references.iter().map(|r| r.to_string()).collect();
                write!(f, "{}", parts.join("; "))
            }
            Notice::JobFinished => write!(f, "Trim job finished"),
        }
    }
}
