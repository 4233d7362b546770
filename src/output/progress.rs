//! Progress reporting for a followed trim job

use serde_json::{json, Value};

use crate::domain::errors::DomainError;
use crate::domain::model::{ProgressSnapshot, SubmissionAck};
use crate::utils::Utils;

/// Receives the observable events of a trim job
pub trait ProgressReporter: Send + Sync {
    /// Job accepted by the service
    fn on_submitted(&self, input: &str, output: &str, ack: &SubmissionAck);

    /// Non-terminal status snapshot
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// One status query failed; polling continues
    fn on_poll_error(&self, error: &DomainError);

    /// Job reported done
    fn on_complete(&self, snapshot: &ProgressSnapshot);

    /// Something the user should look at; not fatal
    fn on_warning(&self, message: &str);

    /// Following the job failed or was abandoned
    fn on_error(&self, message: &str);

    /// User stopped following the job
    fn on_cancel(&self);
}

/// Console reporter for interactive use
pub struct ConsoleProgressReporter {
    bar_width: usize,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self { bar_width: 30 }
    }

    /// One status line, e.g. `Status: processing [███░░] 3/10 (30.0%)`
    pub fn render(&self, snapshot: &ProgressSnapshot) -> String {
        format!(
            "Status: {} [{}] {}/{} ({:.1}%)",
            snapshot.status,
            Utils::progress_bar(snapshot.percent, self.bar_width),
            snapshot.completed,
            snapshot.total,
            snapshot.percent
        )
    }
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_submitted(&self, input: &str, output: &str, ack: &SubmissionAck) {
        println!("Trim job started: {} -> {}", input, output);
        if let Some(status) = ack.status() {
            println!("   Service status: {}", status);
        }
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        println!("{}", self.render(snapshot));
    }

    fn on_poll_error(&self, error: &DomainError) {
        eprintln!("Error reading job status: {}", error);
    }

    fn on_complete(&self, snapshot: &ProgressSnapshot) {
        println!("{}", self.render(snapshot));
        println!("Trim job finished: {} of {} episodes", snapshot.completed, snapshot.total);
    }

    fn on_warning(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    fn on_error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn on_cancel(&self) {
        println!("Stopped following the job; it keeps running on the service");
    }
}

/// JSON lines reporter for scripts
pub struct JsonProgressReporter;

impl JsonProgressReporter {
    pub fn new() -> Self {
        Self
    }

    /// Build one event object stamped with the current time
    pub fn event(kind: &str, fields: Value) -> Value {
        let mut event = json!({
            "event": kind,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let (Some(target), Value::Object(extra)) = (event.as_object_mut(), fields) {
            target.extend(extra);
        }
        event
    }

    fn emit(kind: &str, fields: Value) {
        println!("{}", Self::event(kind, fields));
    }
}

impl Default for JsonProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgressReporter {
    fn on_submitted(&self, input: &str, output: &str, ack: &SubmissionAck) {
        Self::emit(
            "submitted",
            json!({ "input": input, "output": output, "response": ack.response }),
        );
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        Self::emit("progress", json!({ "snapshot": snapshot }));
    }

    fn on_poll_error(&self, error: &DomainError) {
        Self::emit("poll_error", json!({ "error": error.to_string() }));
    }

    fn on_complete(&self, snapshot: &ProgressSnapshot) {
        Self::emit("complete", json!({ "snapshot": snapshot }));
    }

    fn on_warning(&self, message: &str) {
        Self::emit("warning", json!({ "message": message }));
    }

    fn on_error(&self, message: &str) {
        Self::emit("error", json!({ "error": message }));
    }

    fn on_cancel(&self) {
        Self::emit("cancel", json!({}));
    }
}

/// Reporter that drops everything
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn on_submitted(&self, _input: &str, _output: &str, _ack: &SubmissionAck) {}
    fn on_progress(&self, _snapshot: &ProgressSnapshot) {}
    fn on_poll_error(&self, _error: &DomainError) {}
    fn on_complete(&self, _snapshot: &ProgressSnapshot) {}
    fn on_warning(&self, _message: &str) {}
    fn on_error(&self, _message: &str) {}
    fn on_cancel(&self) {}
}
