use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::backend::{DatasetPreview, SavedConfig, StepTestResponse, SuiteBackend, SuiteRecord};
use crate::error::BackendError;
use crate::workflow::{StepName, SuiteId, WorkflowConfig};

/// Scripted reply for one step.
#[derive(Debug, Clone)]
pub enum StepScript {
    Succeed(Value),
    /// Backend rejects with this `detail`.
    Reject(String),
    /// Backend answers 200 with `success: false`.
    ReportFailure(Option<String>),
}

/// In-process [`SuiteBackend`] with scripted step outcomes.
///
/// Versioning follows the real backend: each save bumps `latest_config_version`
/// and makes it current.
pub struct InMemorySuiteBackend {
    suites: DashMap<SuiteId, SuiteRecord>,
    configs: DashMap<SuiteId, WorkflowConfig>,
    datasets: DashMap<Uuid, DatasetPreview>,
    scripts: DashMap<StepName, StepScript>,
    step_delay: DashMap<StepName, Duration>,
    load_failure: Mutex<Option<String>>,
    save_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<(SuiteId, StepName)>>,
}

impl Default for InMemorySuiteBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySuiteBackend {
    pub fn new() -> Self {
        Self {
            suites: DashMap::new(),
            configs: DashMap::new(),
            datasets: DashMap::new(),
            scripts: DashMap::new(),
            step_delay: DashMap::new(),
            load_failure: Mutex::new(None),
            save_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn insert_suite(&self, suite: SuiteRecord) {
        self.suites.insert(suite.id, suite);
    }

    pub fn insert_dataset(&self, dataset_id: Uuid, preview: DatasetPreview) {
        self.datasets.insert(dataset_id, preview);
    }

    pub fn script_step(&self, step: StepName, script: StepScript) {
        self.scripts.insert(step, script);
    }

    /// Hold the reply for `step` back by `delay`.
    pub fn delay_step(&self, step: StepName, delay: Duration) {
        self.step_delay.insert(step, delay);
    }

    /// Make config loads fail with a 500 carrying `detail`. `None` clears it.
    pub async fn fail_loads(&self, detail: Option<&str>) {
        *self.load_failure.lock().await = detail.map(str::to_string);
    }

    /// Make saves fail with a 500 carrying `detail`. `None` clears it.
    pub async fn fail_saves(&self, detail: Option<&str>) {
        *self.save_failure.lock().await = detail.map(str::to_string);
    }

    /// Step tests issued so far, in order.
    pub async fn step_calls(&self) -> Vec<(SuiteId, StepName)> {
        self.calls.lock().await.clone()
    }

    pub fn stored_config(&self, suite_id: SuiteId) -> Option<WorkflowConfig> {
        self.configs.get(&suite_id).map(|c| c.value().clone())
    }

    fn server_error(detail: &str) -> BackendError {
        BackendError::Rejected {
            status: 500,
            detail: Some(detail.to_string()),
            message: detail.to_string(),
        }
    }
}

#[async_trait]
impl SuiteBackend for InMemorySuiteBackend {
    async fn get_suite(&self, suite_id: SuiteId) -> Result<SuiteRecord, BackendError> {
        self.suites
            .get(&suite_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| BackendError::not_found(format!("suite {}", suite_id)))
    }

    async fn get_config(&self, suite_id: SuiteId) -> Result<Option<WorkflowConfig>, BackendError> {
        if let Some(detail) = self.load_failure.lock().await.as_deref() {
            return Err(Self::server_error(detail));
        }
        self.configs
            .get(&suite_id)
            .map(|c| Some(c.value().clone()))
            .ok_or_else(|| BackendError::not_found(format!("config of suite {}", suite_id)))
    }

    async fn put_config(&self, suite_id: SuiteId, config: &WorkflowConfig) -> Result<SavedConfig, BackendError> {
        if let Some(detail) = self.save_failure.lock().await.as_deref() {
            return Err(Self::server_error(detail));
        }

        let mut suite = self
            .suites
            .get_mut(&suite_id)
            .ok_or_else(|| BackendError::not_found(format!("suite {}", suite_id)))?;

        let version = suite.latest_config_version + 1;
        suite.latest_config_version = version;
        suite.current_config_version = version;
        drop(suite);

        let mut stored = config.clone();
        stored.version = version;
        self.configs.insert(suite_id, stored.clone());

        Ok(SavedConfig {
            suite_id: Some(suite_id),
            workflow_config: Some(stored.into_document()),
            version,
        })
    }

    async fn configure_workflow(&self, suite_id: SuiteId) -> Result<(), BackendError> {
        if self.suites.contains_key(&suite_id) {
            Ok(())
        } else {
            Err(BackendError::not_found(format!("suite {}", suite_id)))
        }
    }

    async fn test_step(&self, suite_id: SuiteId, step: StepName) -> Result<StepTestResponse, BackendError> {
        self.calls.lock().await.push((suite_id, step));

        // Clone out before awaiting so no map guard is held across the sleep
        let delay = self.step_delay.get(&step).map(|d| *d.value());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let script = self
            .scripts
            .get(&step)
            .map(|s| s.value().clone())
            .unwrap_or(StepScript::Succeed(Value::Null));

        match script {
            StepScript::Succeed(result) => Ok(StepTestResponse::ok(step, result)),
            StepScript::Reject(detail) => Err(BackendError::Rejected {
                status: 400,
                detail: Some(detail.clone()),
                message: detail,
            }),
            StepScript::ReportFailure(detail) => Ok(StepTestResponse {
                success: false,
                detail,
                ..StepTestResponse::ok(step, Value::Null)
            }),
        }
    }

    async fn dataset_preview(&self, dataset_id: Uuid, limit: usize) -> Result<DatasetPreview, BackendError> {
        let mut preview = self
            .datasets
            .get(&dataset_id)
            .map(|d| d.value().clone())
            .ok_or_else(|| BackendError::not_found(format!("dataset {}", dataset_id)))?;
        preview.rows.truncate(limit);
        Ok(preview)
    }
}
