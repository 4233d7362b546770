// Progress poller - Turns a submitted job into a stream of status snapshots

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Polling schedule and failure policy
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    /// Period between the start of consecutive status queries
    pub interval: Duration,
    /// Give up after this many consecutive failed queries; `None` never gives up
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_consecutive_failures: Some(5),
        }
    }
}

impl From<&ClientConfig> for PollSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_consecutive_failures: config.max_poll_failures,
        }
    }
}

/// Observation produced by one polling stream
///
/// `tick` numbers increase by one per status query within a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// Status query answered; a `done` snapshot is the last event
    Snapshot { tick: u64, snapshot: ProgressSnapshot },
    /// Status query failed; polling continues
    Failed { tick: u64, error: DomainError },
    /// Too many consecutive failures; polling stopped
    GaveUp { consecutive_failures: u32 },
}

struct PollRun {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
    events: mpsc::UnboundedReceiver<PollEvent>,
}

/// Repeated status queries for one job at a time
///
/// Queries are chained: the next one starts only after the previous one
/// resolved, so snapshots arrive in order. After `stop()` returns no further
/// event is delivered, even from a query that was already in flight.
pub struct ProgressPoller {
    service: Arc<dyn TrimServicePort>,
    settings: PollSettings,
    run: Option<PollRun>,
}

impl ProgressPoller {
    /// Create a stopped poller
    pub fn new(service: Arc<dyn TrimServicePort>, settings: PollSettings) -> Self {
        Self {
            service,
            settings,
            run: None,
        }
    }

    /// Start polling; the first query is issued immediately
    ///
    /// Returns `false` without spawning anything if a stream is already
    /// running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("Progress poller already running; start ignored");
            return false;
        }
        // Reap a finished stream whose events were never drained.
        self.stop();

        let cancelled = Arc::new(AtomicBool::new(false));
        let (sender, events) = mpsc::unbounded_channel();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.service),
            self.settings.clone(),
            Arc::clone(&cancelled),
            sender,
        ));

        debug!("Progress poller started ({:?} interval)", self.settings.interval);
        self.run = Some(PollRun {
            handle,
            cancelled,
            events,
        });
        true
    }

    /// Stop polling; safe to call at any time
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            run.cancelled.store(true, Ordering::SeqCst);
            run.handle.abort();
            // Dropping the receiver discards undelivered events.
            drop(run.events);
            debug!("Progress poller stopped");
        }
    }

    /// Whether status queries are still being issued
    pub fn is_running(&self) -> bool {
        self.run
            .as_ref()
            .map_or(false, |run| !run.handle.is_finished())
    }

    /// Wait for the next event of the current stream
    ///
    /// Returns `None` when stopped or when the stream has ended and every
    /// event was delivered.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        let run = self.run.as_mut()?;
        match run.events.recv().await {
            Some(event) => Some(event),
            None => {
                self.run = None;
                None
            }
        }
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    service: Arc<dyn TrimServicePort>,
    settings: PollSettings,
    cancelled: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<PollEvent>,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tick: u64 = 0;
    let mut consecutive_failures: u32 = 0;

    loop {
        ticker.tick().await;
        tick += 1;

        let outcome = service.status().await;
        if cancelled.load(Ordering::SeqCst) {
            debug!("Discarding status response of tick {} after stop", tick);
            return;
        }

        match outcome {
            Ok(snapshot) => {
                consecutive_failures = 0;
                let done = snapshot.done;
                debug!("Tick {}: {}", tick, snapshot);
                if events.send(PollEvent::Snapshot { tick, snapshot }).is_err() {
                    return;
                }
                if done {
                    info!("Job reported done after {} status queries", tick);
                    return;
                }
            }
            Err(error) => {
                consecutive_failures += 1;
                warn!(
                    "Status query {} failed ({} in a row): {}",
                    tick, consecutive_failures, error
                );
                if events.send(PollEvent::Failed { tick, error }).is_err() {
                    return;
                }
                if let Some(limit) = settings.max_consecutive_failures {
                    if consecutive_failures >= limit {
                        warn!("Giving up on job status after {} failures", consecutive_failures);
                        let _ = events.send(PollEvent::GaveUp {
                            consecutive_failures,
                        });
                        return;
                    }
                }
            }
        }
    }
}
