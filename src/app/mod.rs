// Application layer - Use case clients and the session state machine

pub mod container;
pub mod progress_poller;
pub mod scan_client;
pub mod session_controller;
pub mod submission_client;

// Re-export application services
pub use container::{AppContainer, DefaultAppContainer};
pub use progress_poller::{PollEvent, PollSettings, ProgressPoller};
pub use scan_client::ScanClient;
pub use session_controller::{ProgressUpdate, SessionController, SessionView};
pub use submission_client::SubmissionClient;
