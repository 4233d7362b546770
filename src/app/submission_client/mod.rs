// Submission client - Orchestrates the job submission use case

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Client that hands a finished configuration to the service
///
/// A successful submission means the job was accepted, not completed.
#[derive(Clone)]
pub struct SubmissionClient {
    service: Arc<dyn TrimServicePort>,
}

impl SubmissionClient {
    /// Create new submission client with injected service port
    pub fn new(service: Arc<dyn TrimServicePort>) -> Self {
        Self { service }
    }

    /// Build the request body with service-style paths
    pub fn build_request(
        input_path: &str,
        output_path: &str,
        config: &TrimConfiguration,
    ) -> ProcessRequest {
        ProcessRequest {
            input: PathUtils::to_posix(input_path),
            output: PathUtils::to_posix(output_path),
            options: config.clone(),
        }
    }

    /// Start a trim job for every episode of `input_path`
    pub async fn submit(
        &self,
        input_path: &str,
        output_path: &str,
        config: &TrimConfiguration,
    ) -> Result<SubmissionAck, DomainError> {
        if input_path.trim().is_empty() {
            return Err(DomainError::BadArgs("Input folder path is empty".to_string()));
        }
        if output_path.trim().is_empty() {
            return Err(DomainError::BadArgs("Output folder path is empty".to_string()));
        }

        let request = Self::build_request(input_path, output_path, config);
        info!(
            "Submitting trim job: {} -> {} ({} skip ranges, {} parts, audio #{})",
            request.input,
            request.output,
            config.skip_ranges().len(),
            config.parts(),
            config.audio_index()
        );

        match self.service.submit(&request).await {
            Ok(ack) => {
                info!("Trim job accepted: {}", ack.status().unwrap_or("no status"));
                Ok(ack)
            }
            Err(e) => {
                warn!("Trim job submission failed: {}", e);
                Err(match e {
                    DomainError::SubmissionFailed(_) => e,
                    other => DomainError::SubmissionFailed(other.to_string()),
                })
            }
        }
    }
}
