// Scan client - Orchestrates the folder inspection use case

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Client for the one-shot folder scan
#[derive(Clone)]
pub struct ScanClient {
    service: Arc<dyn TrimServicePort>,
}

impl ScanClient {
    /// Create new scan client with injected service port
    pub fn new(service: Arc<dyn TrimServicePort>) -> Self {
        Self { service }
    }

    /// Inspect the representative file of `folder_path`
    ///
    /// Safe to repeat; each call yields a complete, independent result.
    pub async fn scan(&self, folder_path: &str) -> Result<ScanResult, DomainError> {
        if folder_path.trim().is_empty() {
            return Err(DomainError::BadArgs("Input folder path is empty".to_string()));
        }

        let folder = PathUtils::to_posix(folder_path);
        info!("Scanning folder: {}", folder);

        match self.service.scan(&folder).await {
            Ok(result) => {
                info!(
                    "Scan of {} found {} chapters and {} audio tracks",
                    PathUtils::file_name(&result.first_file),
                    result.chapters.len(),
                    result.audio_tracks.len()
                );
                Ok(result)
            }
            Err(e) => {
                warn!("Scan of {} failed: {}", folder, e);
                Err(match e {
                    DomainError::ScanFailed(_) => e,
                    other => DomainError::ScanFailed(other.to_string()),
                })
            }
        }
    }
}
