//! Reconciles the in-memory draft with the backend's versioned configuration.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};
use crate::backend::SuiteBackend;
use crate::error::GatewayError;
use crate::workflow::{SuiteDefaults, SuiteId, WorkflowConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Found(WorkflowConfig),
    /// The suite has no configuration yet.
    NotFound,
}

pub struct ConfigPersistenceGateway {
    backend: Arc<dyn SuiteBackend>,
    known_versions: DashMap<SuiteId, u32>,
}

impl ConfigPersistenceGateway {
    pub fn new(backend: Arc<dyn SuiteBackend>) -> Self {
        Self {
            backend,
            known_versions: DashMap::new(),
        }
    }

    /// Fetch the current configuration. A 404 is not an error.
    pub async fn load(&self, suite_id: SuiteId) -> Result<LoadOutcome, GatewayError> {
        match self.backend.get_config(suite_id).await {
            Ok(Some(config)) => {
                self.known_versions.insert(suite_id, config.version);
                info!(suite_id = %suite_id, version = config.version, "Loaded workflow configuration");
                Ok(LoadOutcome::Found(config))
            }
            Ok(None) => Ok(LoadOutcome::NotFound),
            Err(e) if e.is_not_found() => Ok(LoadOutcome::NotFound),
            Err(e) => {
                warn!(suite_id = %suite_id, error = %e, "Failed to load workflow configuration");
                Err(GatewayError::Load(e))
            }
        }
    }

    /// [`load`](Self::load), falling back to a fresh draft when there is none.
    pub async fn load_or_initialize(
        &self,
        suite_id: SuiteId,
        defaults: &SuiteDefaults,
    ) -> Result<WorkflowConfig, GatewayError> {
        match self.load(suite_id).await? {
            LoadOutcome::Found(config) => Ok(config),
            LoadOutcome::NotFound => {
                info!(suite_id = %suite_id, "No configuration yet, starting a draft");
                Ok(WorkflowConfig::initialize(defaults))
            }
        }
    }

    /// Send the whole draft and return the version the backend assigned.
    ///
    /// No version precondition is sent: the last save wins. `config` is only
    /// borrowed, so the caller's draft survives a failure.
    pub async fn save(&self, suite_id: SuiteId, config: &WorkflowConfig) -> Result<u32, GatewayError> {
        let saved = match self.backend.put_config(suite_id, config).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(suite_id = %suite_id, error = %e, "Failed to save workflow configuration");
                return Err(GatewayError::Save(e));
            }
        };

        let version = saved.version;
        if let Some(previous) = self.known_version(suite_id) {
            if version <= previous {
                warn!(suite_id = %suite_id, previous, version, "Backend returned a non-increasing config version");
            }
        }
        self.known_versions.insert(suite_id, version);
        info!(suite_id = %suite_id, version, "Saved workflow configuration");
        Ok(version)
    }

    /// Ask the backend to set up the suite's workflow. Only success matters.
    pub async fn initialize_remote(&self, suite_id: SuiteId) -> Result<(), GatewayError> {
        self.backend
            .configure_workflow(suite_id)
            .await
            .map_err(GatewayError::Initialize)
    }

    /// Last version seen through load or save.
    pub fn known_version(&self, suite_id: SuiteId) -> Option<u32> {
        self.known_versions.get(&suite_id).map(|v| *v.value())
    }
}
