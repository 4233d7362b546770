// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Parsing rules for the "parts" input
pub struct PartsInput;

impl PartsInput {
    /// Parse user-entered text into a part count
    ///
    /// Only whole numbers >= 1 are accepted; "abc", "1.5", "0" and "-1" are
    /// rejected instead of degrading into a bogus value.
    pub fn parse(input: &str) -> Result<u32, DomainError> {
        let trimmed = input.trim();
        let parts = trimmed
            .parse::<u32>()
            .map_err(|_| DomainError::InvalidPartCount(trimmed.to_string()))?;
        if parts == 0 {
            return Err(DomainError::InvalidPartCount(trimmed.to_string()));
        }
        Ok(parts)
    }
}

/// Actions a session can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Scan,
    EditConfiguration,
    Submit,
    AwaitProgress,
    StopPolling,
    AcknowledgeError,
}

impl SessionAction {
    fn describe(&self) -> &'static str {
        match self {
            SessionAction::Scan => "scan",
            SessionAction::EditConfiguration => "edit the trim configuration",
            SessionAction::Submit => "submit",
            SessionAction::AwaitProgress => "wait for progress",
            SessionAction::StopPolling => "stop polling",
            SessionAction::AcknowledgeError => "acknowledge an error",
        }
    }
}

/// Which actions each session state allows
pub struct SessionGate;

impl SessionGate {
    /// Check whether `action` is valid in `state`
    pub fn allows(state: SessionState, action: SessionAction) -> bool {
        match action {
            SessionAction::Scan => {
                matches!(state, SessionState::Idle | SessionState::Configuring)
            }
            // Configuring is only reachable through a successful scan, so
            // chapters exist whenever these are allowed.
            SessionAction::EditConfiguration | SessionAction::Submit => {
                state == SessionState::Configuring
            }
            SessionAction::AwaitProgress | SessionAction::StopPolling => {
                state == SessionState::Polling
            }
            SessionAction::AcknowledgeError => matches!(state, SessionState::Error(_)),
        }
    }

    /// Fail with `InvalidState` unless `action` is valid in `state`
    pub fn ensure(state: SessionState, action: SessionAction) -> Result<(), DomainError> {
        if Self::allows(state, action) {
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                action: action.describe().to_string(),
                state: state.to_string(),
            })
        }
    }
}

/// Reconciles a configuration with a fresh scan
///
/// Policy: an audio index missing from the new track list falls back to the
/// first listed track (0 when there are none); non-empty skip range labels
/// missing from the new chapter set are cleared.
pub struct ScanReconciler;

impl ScanReconciler {
    pub fn reconcile(
        config: &TrimConfiguration,
        scan: &ScanResult,
    ) -> Result<(TrimConfiguration, Vec<StaleReference>), DomainError> {
        let mut next = config.clone();
        let mut stale = Vec::new();

        for (range, skip) in config.skip_ranges().iter().enumerate() {
            for field in [SkipRangeField::Start, SkipRangeField::End] {
                let label = skip.get(field);
                if !label.is_empty() && !scan.chapters.contains(label) {
                    stale.push(StaleReference::RangeLabel {
                        range,
                        field,
                        label: label.to_string(),
                    });
                    next = next.update_skip_range(range, field, "")?;
                }
            }
        }

        let previous = config.audio_index();
        if !scan.has_audio_track(previous) {
            let replacement = scan.first_audio_index().unwrap_or(0);
            if replacement != previous {
                stale.push(StaleReference::AudioIndex {
                    previous,
                    replacement,
                });
                next = next.set_audio_index(replacement);
            }
        }

        Ok((next, stale))
    }

    /// Skip range labels that do not name a scanned chapter
    pub fn unknown_labels(config: &TrimConfiguration, scan: &ScanResult) -> Vec<String> {
        config
            .skip_ranges()
            .iter()
            .flat_map(|range| [range.start.as_str(), range.end.as_str()])
            .filter(|label| !label.is_empty() && !scan.chapters.contains(label))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests;
