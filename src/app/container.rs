use std::sync::Arc;

use crate::adapters::HttpServiceAdapter;
use crate::app::progress_poller::PollSettings;
use crate::app::scan_client::ScanClient;
use crate::app::session_controller::SessionController;
use crate::domain::errors::DomainError;
use crate::ports::{ClientConfig, TrimServicePort};

pub trait AppContainer: Send + Sync {
    fn service(&self) -> Arc<dyn TrimServicePort>;
    fn scan_client(&self) -> ScanClient;
    fn session_controller(&self) -> SessionController;
}

pub struct DefaultAppContainer {
    service: Arc<dyn TrimServicePort>,
    poll_settings: PollSettings,
}

impl DefaultAppContainer {
    /// Wire the HTTP adapter for `config.service_url`
    pub fn new(config: &ClientConfig) -> Result<Self, DomainError> {
        let service = Arc::new(HttpServiceAdapter::from_config(config)?);
        Ok(Self::with_service(
            service as Arc<dyn TrimServicePort>,
            PollSettings::from(config),
        ))
    }

    /// Wire an arbitrary service implementation
    pub fn with_service(service: Arc<dyn TrimServicePort>, poll_settings: PollSettings) -> Self {
        Self {
            service,
            poll_settings,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn service(&self) -> Arc<dyn TrimServicePort> {
        Arc::clone(&self.service)
    }

    fn scan_client(&self) -> ScanClient {
        ScanClient::new(self.service())
    }

    fn session_controller(&self) -> SessionController {
        SessionController::new(self.service(), self.poll_settings.clone())
    }
}
