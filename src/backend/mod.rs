pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use crate::error::BackendError;
use crate::workflow::{StepName, SuiteDefaults, SuiteId, WorkflowConfig, WorkflowDocument};

// --- Wire types ---

/// Suite record as returned by `GET /suites/{id}`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteRecord {
    pub id: SuiteId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dataset_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_config_version: u32,
    #[serde(default)]
    pub latest_config_version: u32,
}

impl SuiteRecord {
    pub fn new(id: SuiteId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: None,
            dataset_id: None,
            status: Some("ready".to_string()),
            current_config_version: 0,
            latest_config_version: 0,
        }
    }

    pub fn defaults(&self) -> SuiteDefaults {
        SuiteDefaults {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
        }
    }
}

/// `GET /suites/{id}/config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEnvelope {
    #[serde(default)]
    pub suite_id: Option<SuiteId>,
    #[serde(default)]
    pub workflow_config: Option<WorkflowDocument>,
}

/// Body of `PUT /suites/{id}/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfigRequest {
    pub configuration: WorkflowDocument,
}

/// Response of `PUT /suites/{id}/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConfig {
    #[serde(default)]
    pub suite_id: Option<SuiteId>,
    #[serde(default)]
    pub workflow_config: Option<WorkflowDocument>,
    pub version: u32,
}

/// Success payload of the test-suite-step operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTestResponse {
    #[serde(default = "succeeded")]
    pub success: bool,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub necessary_step: Vec<String>,
    #[serde(default)]
    pub results: Map<String, Value>,
    #[serde(default)]
    pub detail: Option<String>,
}

fn succeeded() -> bool {
    true
}

impl StepTestResponse {
    pub fn ok(step: StepName, result: Value) -> Self {
        let mut results = Map::new();
        results.insert(step.as_str().to_string(), result);
        Self {
            success: true,
            dataset_id: None,
            necessary_step: StepName::ALL[..=step.index()]
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            results,
            detail: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPreview {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
    #[serde(default)]
    pub total_rows_in_file: u64,
    #[serde(default)]
    pub file_name: String,
}

/// The backend wraps most payloads as `{message, data}`; some endpoints don't.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

// --- Interface ---

/// The REST collaborator the editor core talks to.
#[async_trait]
pub trait SuiteBackend: Send + Sync {
    async fn get_suite(&self, suite_id: SuiteId) -> Result<SuiteRecord, BackendError>;

    /// Current configuration. `Ok(None)` and `Err(NotFound)` both mean "none yet".
    async fn get_config(&self, suite_id: SuiteId) -> Result<Option<WorkflowConfig>, BackendError>;

    /// Full replace of the configuration; the backend assigns the version.
    async fn put_config(&self, suite_id: SuiteId, config: &WorkflowConfig) -> Result<SavedConfig, BackendError>;

    async fn configure_workflow(&self, suite_id: SuiteId) -> Result<(), BackendError>;

    async fn test_step(&self, suite_id: SuiteId, step: StepName) -> Result<StepTestResponse, BackendError>;

    async fn dataset_preview(&self, dataset_id: Uuid, limit: usize) -> Result<DatasetPreview, BackendError>;
}
