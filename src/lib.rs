//! BatchTrim Client Library
//!
//! Client side of a batch video trimming workflow: scan a folder of episodes
//! through a remote processing service, build a trim configuration from the
//! scanned chapters and audio tracks, submit the job and follow its progress.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{PollSettings, ProgressUpdate, SessionController, SessionView};
pub use domain::errors::{DomainError, ErrorKind};
pub use domain::model::{
    AudioTrack, ChapterSet, Notice, ProgressSnapshot, ScanResult, SessionState, SkipRange,
    SkipRangeField, TrimConfiguration,
};
pub use error::{BatchTrimError, BatchTrimResult};
pub use ports::{ClientConfig, TrimServicePort};
