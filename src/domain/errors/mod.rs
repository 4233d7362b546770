// Domain errors - Error types for the domain layer

use std::fmt;

/// Which remote operation a session-level failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Folder scan failed or returned unparseable data
    Scan,
    /// Job submission was rejected or never reached the service
    Submission,
    /// Status polling gave up after repeated failures
    Poll,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Scan => write!(f, "scan"),
            ErrorKind::Submission => write!(f, "submission"),
            ErrorKind::Poll => write!(f, "poll"),
        }
    }
}

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Scan request failed or its payload could not be parsed
    ScanFailed(String),
    /// Submission request failed
    SubmissionFailed(String),
    /// A status query failed while polling
    PollFailed(String),
    /// Part count was not a positive integer
    InvalidPartCount(String),
    /// Skip range position does not exist
    IndexOutOfRange { index: usize, len: usize },
    /// Action is not allowed in the current session state
    InvalidState { action: String, state: String },
    /// Client settings are missing or malformed
    ConfigError(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Session error kind for remote operation failures
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            DomainError::ScanFailed(_) => Some(ErrorKind::Scan),
            DomainError::SubmissionFailed(_) => Some(ErrorKind::Submission),
            DomainError::PollFailed(_) => Some(ErrorKind::Poll),
            _ => None,
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::ScanFailed(msg) => write!(f, "Scan failed: {}", msg),
            DomainError::SubmissionFailed(msg) => write!(f, "Submission failed: {}", msg),
            DomainError::PollFailed(msg) => write!(f, "Status query failed: {}", msg),
            DomainError::InvalidPartCount(input) => {
                write!(f, "Invalid part count '{}': expected a whole number of at least 1", input)
            }
            DomainError::IndexOutOfRange { index, len } => {
                write!(f, "Skip range index {} out of range (have {})", index, len)
            }
            DomainError::InvalidState { action, state } => {
                write!(f, "Cannot {} while session is {}", action, state)
            }
            DomainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
