// Session controller - State machine tying scan, configuration, submission and polling together

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::app::progress_poller::{PollEvent, PollSettings, ProgressPoller};
use crate::app::scan_client::ScanClient;
use crate::app::submission_client::SubmissionClient;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Everything a presentation layer needs to render the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub chapter_labels: Vec<String>,
    pub audio_tracks: Vec<AudioTrack>,
    pub configuration: TrimConfiguration,
    pub progress: Option<ProgressSnapshot>,
    pub notice: Option<Notice>,
}

impl SessionView {
    /// Show a loading indicator
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}

/// Result of waiting for job progress
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Job still running
    Snapshot(ProgressSnapshot),
    /// Job reported done; the session is back in `Configuring`
    Finished(ProgressSnapshot),
    /// One status query failed; still polling
    Failed(DomainError),
    /// Polling gave up; the session holds `Error(Poll)`
    Abandoned { consecutive_failures: u32 },
    /// Stream ended without a done snapshot; back in `Configuring`
    Ended,
}

/// One trim session
///
/// The controller exclusively owns the configuration, the current scan and
/// the latest progress snapshot. Every transition is published to watchers.
pub struct SessionController {
    scan_client: ScanClient,
    submission_client: SubmissionClient,
    poller: ProgressPoller,
    state: SessionState,
    /// Stable state restored by `acknowledge_error`
    resume_state: SessionState,
    scan_result: Option<ScanResult>,
    input_path: Option<String>,
    configuration: TrimConfiguration,
    progress: Option<ProgressSnapshot>,
    notice: Option<Notice>,
    last_tick: u64,
    view: watch::Sender<SessionView>,
}

impl SessionController {
    /// Create an idle session backed by `service`
    pub fn new(service: Arc<dyn TrimServicePort>, poll_settings: PollSettings) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            scan_client: ScanClient::new(Arc::clone(&service)),
            submission_client: SubmissionClient::new(Arc::clone(&service)),
            poller: ProgressPoller::new(service, poll_settings),
            state: SessionState::Idle,
            resume_state: SessionState::Idle,
            scan_result: None,
            input_path: None,
            configuration: TrimConfiguration::new(),
            progress: None,
            notice: None,
            last_tick: 0,
            view,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn configuration(&self) -> &TrimConfiguration {
        &self.configuration
    }

    pub fn scan_result(&self) -> Option<&ScanResult> {
        self.scan_result.as_ref()
    }

    /// Folder of the last successful scan
    pub fn input_path(&self) -> Option<&str> {
        self.input_path.as_deref()
    }

    pub fn progress(&self) -> Option<&ProgressSnapshot> {
        self.progress.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn chapter_labels(&self) -> Vec<String> {
        self.scan_result
            .as_ref()
            .map(ScanResult::chapter_labels)
            .unwrap_or_default()
    }

    pub fn audio_tracks(&self) -> &[AudioTrack] {
        self.scan_result
            .as_ref()
            .map(|scan| scan.audio_tracks.as_slice())
            .unwrap_or(&[])
    }

    /// Watch every published transition
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Current view snapshot
    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            chapter_labels: self.chapter_labels(),
            audio_tracks: self.audio_tracks().to_vec(),
            configuration: self.configuration.clone(),
            progress: self.progress.clone(),
            notice: self.notice.clone(),
        }
    }

    /// Scan `folder_path` and enter `Configuring`
    ///
    /// On failure the previous scan result and configuration are untouched
    /// and the session holds `Error(Scan)`.
    pub async fn scan(&mut self, folder_path: &str) -> Result<ScanResult, DomainError> {
        SessionGate::ensure(self.state, SessionAction::Scan)?;
        let stable = self.state;
        self.transition(SessionState::Scanning);

        match self.scan_client.scan(folder_path).await {
            Ok(scan) => {
                let (configuration, stale) =
                    match ScanReconciler::reconcile(&self.configuration, &scan) {
                        Ok(reconciled) => reconciled,
                        Err(e) => {
                            self.transition(stable);
                            return Err(e);
                        }
                    };
                for reference in &stale {
                    warn!("Stale configuration reference: {}", reference);
                }
                self.configuration = configuration;
                self.notice = if stale.is_empty() {
                    None
                } else {
                    Some(Notice::StaleReferencesCleared(stale))
                };
                self.input_path = Some(folder_path.to_string());
                self.scan_result = Some(scan.clone());
                self.transition(SessionState::Configuring);
                Ok(scan)
            }
            Err(e) => {
                self.fail(stable, e.clone());
                Err(e)
            }
        }
    }

    /// Append an empty skip range
    pub fn add_skip_range(&mut self) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::EditConfiguration)?;
        self.configuration = self.configuration.add_skip_range();
        self.publish();
        Ok(())
    }

    pub fn update_skip_range(
        &mut self,
        index: usize,
        field: SkipRangeField,
        value: &str,
    ) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::EditConfiguration)?;
        self.configuration = self.configuration.update_skip_range(index, field, value)?;
        self.publish();
        Ok(())
    }

    pub fn remove_skip_range(&mut self, index: usize) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::EditConfiguration)?;
        self.configuration = self.configuration.remove_skip_range(index)?;
        self.publish();
        Ok(())
    }

    pub fn set_parts(&mut self, parts: i64) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::EditConfiguration)?;
        self.configuration = self.configuration.set_parts(parts)?;
        self.publish();
        Ok(())
    }

    /// Set the part count from user-entered text
    pub fn set_parts_input(&mut self, input: &str) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::EditConfiguration)?;
        let parts = PartsInput::parse(input)?;
        self.set_parts(i64::from(parts))
    }

    /// Select the audio track; not checked against the track list
    pub fn set_audio_index(&mut self, index: u32) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::EditConfiguration)?;
        self.configuration = self.configuration.set_audio_index(index);
        self.publish();
        Ok(())
    }

    /// Submit the current configuration and start following the job
    pub async fn submit(
        &mut self,
        input_path: &str,
        output_path: &str,
    ) -> Result<SubmissionAck, DomainError> {
        SessionGate::ensure(self.state, SessionAction::Submit)?;
        if let Some(scan) = &self.scan_result {
            for label in ScanReconciler::unknown_labels(&self.configuration, scan) {
                warn!("Skip label '{}' is not a scanned chapter", label);
            }
        }
        self.transition(SessionState::Submitting);

        match self
            .submission_client
            .submit(input_path, output_path, &self.configuration)
            .await
        {
            Ok(ack) => {
                self.progress = None;
                self.notice = None;
                self.last_tick = 0;
                self.poller.start();
                self.transition(SessionState::Polling);
                Ok(ack)
            }
            Err(e) => {
                self.fail(SessionState::Configuring, e.clone());
                Err(e)
            }
        }
    }

    /// Wait for the next progress observation and apply it
    pub async fn next_progress(&mut self) -> Result<ProgressUpdate, DomainError> {
        SessionGate::ensure(self.state, SessionAction::AwaitProgress)?;

        loop {
            let Some(event) = self.poller.next_event().await else {
                debug!("Progress stream ended without completion");
                self.transition(SessionState::Configuring);
                return Ok(ProgressUpdate::Ended);
            };

            if let Some(update) = self.apply_event(event) {
                return Ok(update);
            }
        }
    }

    /// Apply one poller event; `None` when the event was a stale tick
    fn apply_event(&mut self, event: PollEvent) -> Option<ProgressUpdate> {
        match event {
            PollEvent::Snapshot { tick, .. } | PollEvent::Failed { tick, .. }
                if tick <= self.last_tick =>
            {
                debug!("Dropping stale tick {} (last applied {})", tick, self.last_tick);
                None
            }
            PollEvent::Snapshot { tick, snapshot } => {
                self.last_tick = tick;
                self.progress = Some(snapshot.clone());
                if snapshot.done {
                    self.poller.stop();
                    self.notice = Some(Notice::JobFinished);
                    info!("Trim job finished: {}", snapshot);
                    self.transition(SessionState::Configuring);
                    return Some(ProgressUpdate::Finished(snapshot));
                }
                self.publish();
                Some(ProgressUpdate::Snapshot(snapshot))
            }
            PollEvent::Failed { tick, error } => {
                self.last_tick = tick;
                self.notice = Some(Notice::PollFailed(failure_reason(&error)));
                self.publish();
                Some(ProgressUpdate::Failed(error))
            }
            PollEvent::GaveUp {
                consecutive_failures,
            } => {
                self.poller.stop();
                self.resume_state = SessionState::Configuring;
                self.notice = Some(Notice::PollingAbandoned {
                    consecutive_failures,
                });
                self.transition(SessionState::Error(ErrorKind::Poll));
                Some(ProgressUpdate::Abandoned {
                    consecutive_failures,
                })
            }
        }
    }

    /// Stop following the job; the remote job keeps running
    pub fn stop_polling(&mut self) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::StopPolling)?;
        self.poller.stop();
        info!("Stopped following the trim job");
        self.transition(SessionState::Configuring);
        Ok(())
    }

    /// Leave an error state, returning to the last stable state
    pub fn acknowledge_error(&mut self) -> Result<(), DomainError> {
        SessionGate::ensure(self.state, SessionAction::AcknowledgeError)?;
        self.notice = None;
        let resume = self.resume_state;
        self.transition(resume);
        Ok(())
    }

    /// Release the polling timer
    pub fn shutdown(&mut self) {
        self.poller.stop();
    }

    /// Record a failed remote operation
    ///
    /// Failures without an operation kind (bad arguments) leave no trace in
    /// the session beyond returning to `stable`.
    fn fail(&mut self, stable: SessionState, error: DomainError) {
        match error.kind() {
            Some(kind) => {
                warn!("Session entering {} error: {}", kind, error);
                let reason = failure_reason(&error);
                self.notice = Some(match kind {
                    ErrorKind::Scan => Notice::ScanFailed(reason),
                    ErrorKind::Submission => Notice::SubmissionFailed(reason),
                    ErrorKind::Poll => Notice::PollFailed(reason),
                });
                self.resume_state = stable;
                self.transition(SessionState::Error(kind));
            }
            None => self.transition(stable),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("Session state {} -> {}", self.state, next);
        }
        if self.state == SessionState::Polling && next != SessionState::Polling {
            self.poller.stop();
        }
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn failure_reason(error: &DomainError) -> String {
    match error {
        DomainError::ScanFailed(reason)
        | DomainError::SubmissionFailed(reason)
        | DomainError::PollFailed(reason) => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct UnreachableService;

    #[async_trait]
    impl TrimServicePort for UnreachableService {
        async fn scan(&self, _folder_path: &str) -> Result<ScanResult, DomainError> {
            Err(DomainError::ScanFailed("connection refused".to_string()))
        }

        async fn submit(&self, _request: &ProcessRequest) -> Result<SubmissionAck, DomainError> {
            Err(DomainError::SubmissionFailed("connection refused".to_string()))
        }

        async fn status(&self) -> Result<ProgressSnapshot, DomainError> {
            Err(DomainError::PollFailed("connection refused".to_string()))
        }
    }

    fn controller() -> SessionController {
        SessionController::new(
            Arc::new(UnreachableService),
            PollSettings {
                interval: Duration::from_millis(10),
                max_consecutive_failures: Some(1),
            },
        )
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let session = controller();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.configuration(), &TrimConfiguration::new());
        assert!(session.chapter_labels().is_empty());
        assert!(session.notice().is_none());
    }

    #[tokio::test]
    async fn test_edits_rejected_before_scan() {
        let mut session = controller();
        assert!(matches!(
            session.add_skip_range(),
            Err(DomainError::InvalidState { .. })
        ));
        assert!(matches!(
            session.submit("/in", "/out").await,
            Err(DomainError::InvalidState { .. })
        ));
        assert!(matches!(
            session.stop_polling(),
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_scan_waits_for_acknowledgment() {
        let mut session = controller();
        let mut view = session.subscribe();

        let err = session.scan("C:\\media\\in").await.unwrap_err();
        assert!(matches!(err, DomainError::ScanFailed(_)));
        assert_eq!(session.state(), SessionState::Error(ErrorKind::Scan));
        assert_eq!(
            session.notice().map(|n| n.to_string()),
            Some("Error scanning folder: connection refused".to_string())
        );
        assert!(view.has_changed().unwrap());
        assert_eq!(view.borrow_and_update().state, SessionState::Error(ErrorKind::Scan));

        assert!(session.scan("/again").await.is_err());
        session.acknowledge_error().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.notice().is_none());
    }

    fn snapshot(completed: u64, done: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            status: "processing".to_string(),
            completed,
            total: 3,
            percent: (completed * 100 / 3) as f64,
            done,
        }
    }

    #[tokio::test]
    async fn test_out_of_order_ticks_are_dropped() {
        let mut session = controller();
        session.state = SessionState::Polling;

        let applied = session.apply_event(PollEvent::Snapshot {
            tick: 2,
            snapshot: snapshot(2, false),
        });
        assert_eq!(applied, Some(ProgressUpdate::Snapshot(snapshot(2, false))));

        for tick in [1, 2] {
            assert!(session
                .apply_event(PollEvent::Snapshot {
                    tick,
                    snapshot: snapshot(1, false),
                })
                .is_none());
        }
        assert!(session
            .apply_event(PollEvent::Failed {
                tick: 1,
                error: DomainError::PollFailed("late".to_string()),
            })
            .is_none());
        assert_eq!(session.progress().map(|p| p.completed), Some(2));
        assert!(session.notice().is_none());

        let applied = session.apply_event(PollEvent::Snapshot {
            tick: 3,
            snapshot: snapshot(3, true),
        });
        assert_eq!(applied, Some(ProgressUpdate::Finished(snapshot(3, true))));
        assert_eq!(session.state(), SessionState::Configuring);
    }

    #[tokio::test]
    async fn test_empty_folder_is_rejected_without_error_state() {
        let mut session = controller();
        let err = session.scan("  ").await.unwrap_err();
        assert!(matches!(err, DomainError::BadArgs(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }
}
