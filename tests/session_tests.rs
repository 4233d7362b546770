use std::sync::Arc;
use std::time::Duration;

use batchtrim::*;
use batchtrim::domain::model::{ProcessRequest, SubmissionAck};

/// Scripted stand-in for the processing service
mod test_utils {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub struct ScriptedService {
        scans: Mutex<VecDeque<Result<ScanResult, DomainError>>>,
        submit_result: Mutex<Result<(), DomainError>>,
        statuses: Mutex<VecDeque<Result<ProgressSnapshot, DomainError>>>,
        submitted: Mutex<Vec<ProcessRequest>>,
        scanned: Mutex<Vec<String>>,
        status_calls: AtomicUsize,
    }

    impl ScriptedService {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                scans: Mutex::new(VecDeque::new()),
                submit_result: Mutex::new(Ok(())),
                statuses: Mutex::new(VecDeque::new()),
                submitted: Mutex::new(Vec::new()),
                scanned: Mutex::new(Vec::new()),
                status_calls: AtomicUsize::new(0),
            })
        }

        pub fn push_scan(&self, result: Result<ScanResult, DomainError>) {
            self.scans.lock().unwrap().push_back(result);
        }

        pub fn fail_submissions(&self, reason: &str) {
            *self.submit_result.lock().unwrap() =
                Err(DomainError::SubmissionFailed(reason.to_string()));
        }

        pub fn push_status(&self, result: Result<ProgressSnapshot, DomainError>) {
            self.statuses.lock().unwrap().push_back(result);
        }

        pub fn submitted(&self) -> Vec<ProcessRequest> {
            self.submitted.lock().unwrap().clone()
        }

        pub fn scanned(&self) -> Vec<String> {
            self.scanned.lock().unwrap().clone()
        }

        pub fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TrimServicePort for ScriptedService {
        async fn scan(&self, folder_path: &str) -> Result<ScanResult, DomainError> {
            self.scanned.lock().unwrap().push(folder_path.to_string());
            self.scans
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DomainError::ScanFailed("no scan scripted".to_string())))
        }

        async fn submit(&self, request: &ProcessRequest) -> Result<SubmissionAck, DomainError> {
            self.submit_result.lock().unwrap().clone()?;
            self.submitted.lock().unwrap().push(request.clone());
            Ok(SubmissionAck::new(serde_json::json!({ "status": "started" })))
        }

        async fn status(&self) -> Result<ProgressSnapshot, DomainError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DomainError::PollFailed("no status scripted".to_string())))
        }
    }

    pub fn episode_scan() -> ScanResult {
        ScanResult {
            chapters: [("00:00", 0.0), ("01:30", 1.0), ("22:00", 2.0), ("23:30", 3.0)]
                .into_iter()
                .collect(),
            audio_tracks: vec![AudioTrack::new(0, "jpn", "")],
            first_file: "/media/in/ep01.mkv".to_string(),
        }
    }

    pub fn snapshot(completed: u64, total: u64, percent: f64, done: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            status: if done { "done" } else { "processing" }.to_string(),
            completed,
            total,
            percent,
            done,
        }
    }

    pub fn session(service: Arc<ScriptedService>) -> SessionController {
        SessionController::new(
            service,
            PollSettings {
                interval: Duration::from_secs(2),
                max_consecutive_failures: Some(3),
            },
        )
    }
}

use test_utils::*;

#[tokio::test]
async fn test_scan_populates_chapters_in_order() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    let mut session = session(service);

    session.scan("/media/in").await.unwrap();

    assert_eq!(session.state(), SessionState::Configuring);
    assert_eq!(session.chapter_labels(), vec!["00:00", "01:30", "22:00", "23:30"]);
    assert_eq!(session.configuration().audio_index(), 0);
    assert!(session.notice().is_none());
}

#[tokio::test]
async fn test_submitted_payload_matches_configuration() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    let mut session = session(service.clone());
    session.scan("/media/in").await.unwrap();

    session.add_skip_range().unwrap();
    session.add_skip_range().unwrap();
    session.update_skip_range(0, SkipRangeField::Start, "01:30").unwrap();
    session.update_skip_range(0, SkipRangeField::End, "22:00").unwrap();
    session.update_skip_range(1, SkipRangeField::Start, "23:30").unwrap();
    session.set_parts_input("2").unwrap();

    let ack = session.submit("/media/in", "/media/out").await.unwrap();
    assert_eq!(ack.status(), Some("started"));
    assert_eq!(session.state(), SessionState::Polling);

    let submitted = service.submitted();
    assert_eq!(submitted.len(), 1);
    let body = serde_json::to_value(&submitted[0]).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "input": "/media/in",
            "output": "/media/out",
            "options": {
                "skipRanges": [
                    { "start": "01:30", "end": "22:00" },
                    { "start": "23:30", "end": "" }
                ],
                "parts": 2,
                "audioIndex": 0
            }
        })
    );
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_after_done_snapshot() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    service.push_status(Ok(snapshot(1, 3, 33.0, false)));
    service.push_status(Ok(snapshot(2, 3, 66.0, false)));
    service.push_status(Ok(snapshot(3, 3, 100.0, true)));
    let mut session = session(service.clone());
    session.scan("/media/in").await.unwrap();
    session.submit("/media/in", "/media/out").await.unwrap();

    let mut updates = Vec::new();
    loop {
        let update = session.next_progress().await.unwrap();
        let finished = matches!(update, ProgressUpdate::Finished(_));
        updates.push(update);
        if finished {
            break;
        }
    }

    assert_eq!(updates.len(), 3);
    assert_eq!(session.state(), SessionState::Configuring);
    assert_eq!(session.progress().map(|p| p.done), Some(true));
    assert_eq!(session.notice(), Some(&Notice::JobFinished));
    assert!(session.next_progress().await.is_err());

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(service.status_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_windows_paths_are_sent_with_forward_slashes() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    let mut session = session(service.clone());

    session.scan("C:\\media\\in").await.unwrap();
    assert_eq!(service.scanned(), vec!["C:/media/in"]);

    session.submit("C:\\media\\in", "D:\\out\\x").await.unwrap();
    let submitted = service.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].input, "C:/media/in");
    assert_eq!(submitted[0].output, "D:/out/x");

    session.stop_polling().unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(session.state(), SessionState::Configuring);
    assert!(session.progress().is_none());
}

#[tokio::test]
async fn test_scan_is_idempotent() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    service.push_scan(Ok(episode_scan()));
    let mut session = session(service);

    let first = session.scan("/media/in").await.unwrap();
    session.set_audio_index(0).unwrap();
    let configuration = session.configuration().clone();
    let second = session.scan("/media/in").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(session.configuration(), &configuration);
    assert!(session.notice().is_none());
}

#[tokio::test]
async fn test_failed_rescan_keeps_previous_result() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    service.push_scan(Err(DomainError::ScanFailed("HTTP 500".to_string())));
    let mut session = session(service);
    session.scan("/media/in").await.unwrap();
    session.add_skip_range().unwrap();

    assert!(session.scan("/media/other").await.is_err());
    assert_eq!(session.state(), SessionState::Error(ErrorKind::Scan));
    assert_eq!(session.chapter_labels().len(), 4);
    assert_eq!(session.input_path(), Some("/media/in"));
    assert_eq!(
        session.notice().unwrap().to_string(),
        "Error scanning folder: HTTP 500"
    );

    session.acknowledge_error().unwrap();
    assert_eq!(session.state(), SessionState::Configuring);
    assert_eq!(session.configuration().skip_ranges().len(), 1);
}

#[tokio::test]
async fn test_rescan_clears_stale_references() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    let mut other = episode_scan();
    other.chapters = [("00:00", 0.0), ("Opening", 1.0)].into_iter().collect();
    other.audio_tracks = vec![AudioTrack::new(2, "eng", "")];
    service.push_scan(Ok(other));
    let mut session = session(service);

    session.scan("/media/in").await.unwrap();
    session.add_skip_range().unwrap();
    session.update_skip_range(0, SkipRangeField::Start, "00:00").unwrap();
    session.update_skip_range(0, SkipRangeField::End, "01:30").unwrap();

    session.scan("/media/other").await.unwrap();
    assert_eq!(session.configuration().skip_ranges(), &[SkipRange::new("00:00", "")]);
    assert_eq!(session.configuration().audio_index(), 2);
    match session.notice() {
        Some(Notice::StaleReferencesCleared(references)) => assert_eq!(references.len(), 2),
        other => panic!("unexpected notice: {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_submission_keeps_configuration() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    service.fail_submissions("connection refused");
    let mut session = session(service.clone());
    session.scan("/media/in").await.unwrap();
    session.set_parts(3).unwrap();

    let err = session.submit("/media/in", "/media/out").await.unwrap_err();
    assert!(matches!(err, DomainError::SubmissionFailed(_)));
    assert_eq!(session.state(), SessionState::Error(ErrorKind::Submission));
    assert_eq!(
        session.notice().unwrap().to_string(),
        "Error starting trim process: connection refused"
    );

    session.acknowledge_error().unwrap();
    assert_eq!(session.state(), SessionState::Configuring);
    assert_eq!(session.configuration().parts(), 3);
    assert_eq!(service.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_polling_cancels_further_ticks() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    service.push_status(Ok(snapshot(1, 3, 33.0, false)));
    service.push_status(Ok(snapshot(2, 3, 66.0, false)));
    let mut session = session(service.clone());
    session.scan("/media/in").await.unwrap();
    session.submit("/media/in", "/media/out").await.unwrap();

    assert!(matches!(
        session.next_progress().await.unwrap(),
        ProgressUpdate::Snapshot(_)
    ));
    session.stop_polling().unwrap();
    assert_eq!(session.state(), SessionState::Configuring);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.status_calls(), 1);
    assert_eq!(session.progress().map(|p| p.completed), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_persistent_poll_failures_give_up() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    let mut session = session(service.clone());
    session.scan("/media/in").await.unwrap();
    session.submit("/media/in", "/media/out").await.unwrap();

    for _ in 0..3 {
        assert!(matches!(
            session.next_progress().await.unwrap(),
            ProgressUpdate::Failed(DomainError::PollFailed(_))
        ));
        assert_eq!(session.state(), SessionState::Polling);
    }
    assert_eq!(
        session.next_progress().await.unwrap(),
        ProgressUpdate::Abandoned {
            consecutive_failures: 3
        }
    );
    assert_eq!(session.state(), SessionState::Error(ErrorKind::Poll));

    session.acknowledge_error().unwrap();
    assert_eq!(session.state(), SessionState::Configuring);
}

#[tokio::test]
async fn test_actions_gated_by_state() {
    let service = ScriptedService::new();
    let mut session = session(service);

    assert!(matches!(
        session.set_parts(2),
        Err(DomainError::InvalidState { .. })
    ));
    assert!(matches!(
        session.next_progress().await,
        Err(DomainError::InvalidState { .. })
    ));
    assert!(matches!(
        session.acknowledge_error(),
        Err(DomainError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_view_is_published_on_transitions() {
    let service = ScriptedService::new();
    service.push_scan(Ok(episode_scan()));
    let mut session = session(service);
    let mut view = session.subscribe();

    session.scan("/media/in").await.unwrap();
    assert!(view.has_changed().unwrap());
    let current = view.borrow_and_update().clone();
    assert_eq!(current.state, SessionState::Configuring);
    assert_eq!(current.audio_tracks[0].display_label(), "#0 — jpn");

    session.set_parts_input("4").unwrap();
    assert_eq!(view.borrow_and_update().configuration.parts(), 4);
    assert!(matches!(
        session.set_parts_input("1.5"),
        Err(DomainError::InvalidPartCount(_))
    ));
    assert_eq!(session.configuration().parts(), 4);
}
