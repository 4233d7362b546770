// Unit tests for business rules

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;

fn create_test_scan() -> ScanResult {
    ScanResult {
        chapters: [("00:00", 0.0), ("01:30", 1.0), ("22:00", 2.0), ("23:30", 3.0)]
            .into_iter()
            .collect(),
        audio_tracks: vec![AudioTrack::new(1, "jpn", ""), AudioTrack::new(2, "eng", "")],
        first_file: "/media/in/ep01.mkv".to_string(),
    }
}

#[test]
fn test_parts_input_rejects_invalid_text() {
    for input in ["0", "-1", "abc", "1.5", "", "NaN"] {
        assert!(
            matches!(PartsInput::parse(input), Err(DomainError::InvalidPartCount(_))),
            "accepted {:?}",
            input
        );
    }
}

#[test]
fn test_parts_input_accepts_whole_numbers() {
    assert_eq!(PartsInput::parse("1").unwrap(), 1);
    assert_eq!(PartsInput::parse(" 2 ").unwrap(), 2);
    assert_eq!(PartsInput::parse("100").unwrap(), 100);
}

#[test]
fn test_session_gate_scan() {
    assert!(SessionGate::allows(SessionState::Idle, SessionAction::Scan));
    assert!(SessionGate::allows(SessionState::Configuring, SessionAction::Scan));
    assert!(!SessionGate::allows(SessionState::Scanning, SessionAction::Scan));
    assert!(!SessionGate::allows(SessionState::Polling, SessionAction::Scan));
    assert!(!SessionGate::allows(
        SessionState::Error(ErrorKind::Scan),
        SessionAction::Scan
    ));
}

#[test]
fn test_session_gate_submit_requires_configuring() {
    for state in [
        SessionState::Idle,
        SessionState::Scanning,
        SessionState::Submitting,
        SessionState::Polling,
        SessionState::Error(ErrorKind::Submission),
    ] {
        assert!(!SessionGate::allows(state, SessionAction::Submit));
        assert!(!SessionGate::allows(state, SessionAction::EditConfiguration));
    }
    assert!(SessionGate::allows(SessionState::Configuring, SessionAction::Submit));
}

#[test]
fn test_session_gate_error_message() {
    let err = SessionGate::ensure(SessionState::Polling, SessionAction::Submit).unwrap_err();
    assert_eq!(err.to_string(), "Cannot submit while session is polling");
    assert!(SessionGate::ensure(
        SessionState::Error(ErrorKind::Poll),
        SessionAction::AcknowledgeError
    )
    .is_ok());
}

#[test]
fn test_reconcile_keeps_valid_references() {
    let scan = create_test_scan();
    let config = TrimConfiguration::new()
        .set_audio_index(2)
        .add_skip_range()
        .update_skip_range(0, SkipRangeField::Start, "01:30")
        .unwrap();

    let (next, stale) = ScanReconciler::reconcile(&config, &scan).unwrap();
    assert_eq!(next, config);
    assert!(stale.is_empty());
}

#[test]
fn test_reconcile_clears_unknown_labels() {
    let scan = create_test_scan();
    let config = TrimConfiguration::new()
        .set_audio_index(1)
        .add_skip_range()
        .update_skip_range(0, SkipRangeField::Start, "Opening")
        .and_then(|c| c.update_skip_range(0, SkipRangeField::End, "01:30"))
        .unwrap();

    let (next, stale) = ScanReconciler::reconcile(&config, &scan).unwrap();
    assert_eq!(next.skip_ranges(), &[SkipRange::new("", "01:30")]);
    assert_eq!(
        stale,
        vec![StaleReference::RangeLabel {
            range: 0,
            field: SkipRangeField::Start,
            label: "Opening".to_string(),
        }]
    );
}

#[test]
fn test_reconcile_replaces_missing_audio_track() {
    let scan = create_test_scan();
    let config = TrimConfiguration::new();

    let (next, stale) = ScanReconciler::reconcile(&config, &scan).unwrap();
    assert_eq!(next.audio_index(), 1);
    assert_eq!(
        stale,
        vec![StaleReference::AudioIndex {
            previous: 0,
            replacement: 1
        }]
    );
}

#[test]
fn test_reconcile_without_audio_tracks_falls_back_to_zero() {
    let mut scan = create_test_scan();
    scan.audio_tracks.clear();

    let (next, stale) = ScanReconciler::reconcile(&TrimConfiguration::new(), &scan).unwrap();
    assert_eq!(next.audio_index(), 0);
    assert!(stale.is_empty());

    let (next, stale) =
        ScanReconciler::reconcile(&TrimConfiguration::new().set_audio_index(4), &scan).unwrap();
    assert_eq!(next.audio_index(), 0);
    assert_eq!(stale.len(), 1);
}

#[test]
fn test_unknown_labels() {
    let scan = create_test_scan();
    let config = TrimConfiguration::new()
        .add_skip_range()
        .add_skip_range()
        .update_skip_range(0, SkipRangeField::Start, "01:30")
        .and_then(|c| c.update_skip_range(0, SkipRangeField::End, "Ending"))
        .and_then(|c| c.update_skip_range(1, SkipRangeField::Start, "99:99"))
        .unwrap();

    assert_eq!(ScanReconciler::unknown_labels(&config, &scan), vec!["Ending", "99:99"]);
}
