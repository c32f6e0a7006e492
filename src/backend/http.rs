use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;
use tracing::debug;
use crate::backend::{
    ConfigEnvelope, DatasetPreview, Envelope, SaveConfigRequest, SavedConfig, StepTestResponse,
    SuiteBackend, SuiteRecord,
};
use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::workflow::{StepName, SuiteId, WorkflowConfig};

/// [`SuiteBackend`] over the backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpSuiteBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpSuiteBackend {
    pub fn new(config: ClientConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();

        // FastAPI errors carry `{"detail": ...}`; anything else is kept as text
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body.get("detail").cloned())
            .map(|detail| match detail {
                Value::String(s) => s,
                other => other.to_string(),
            });

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound { resource: url, detail });
        }

        let message = detail.clone().unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

        Err(BackendError::Rejected {
            status: status.as_u16(),
            detail,
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let response = self.send(builder).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }
}

#[async_trait]
impl SuiteBackend for HttpSuiteBackend {
    async fn get_suite(&self, suite_id: SuiteId) -> Result<SuiteRecord, BackendError> {
        let url = self.config.endpoint(&format!("/suites/{}", suite_id));
        debug!(%url, "GET suite");
        let envelope: Envelope<SuiteRecord> = self.send_json(self.client.get(url)).await?;
        Ok(envelope.into_inner())
    }

    async fn get_config(&self, suite_id: SuiteId) -> Result<Option<WorkflowConfig>, BackendError> {
        let url = self.config.endpoint(&format!("/suites/{}/config", suite_id));
        debug!(%url, "GET config");
        let envelope: Envelope<ConfigEnvelope> = self.send_json(self.client.get(url)).await?;
        Ok(envelope.into_inner().workflow_config.map(|doc| doc.workflow))
    }

    async fn put_config(&self, suite_id: SuiteId, config: &WorkflowConfig) -> Result<SavedConfig, BackendError> {
        let url = self.config.endpoint(&format!("/suites/{}/config", suite_id));
        debug!(%url, "PUT config");
        let body = SaveConfigRequest {
            configuration: config.clone().into_document(),
        };
        let envelope: Envelope<SavedConfig> = self.send_json(self.client.put(url).json(&body)).await?;
        Ok(envelope.into_inner())
    }

    async fn configure_workflow(&self, suite_id: SuiteId) -> Result<(), BackendError> {
        let url = self.config.endpoint(&format!("/suites/{}/configure_workflow", suite_id));
        debug!(%url, "POST configure_workflow");
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn test_step(&self, suite_id: SuiteId, step: StepName) -> Result<StepTestResponse, BackendError> {
        let url = self.config.endpoint(&format!("/suites/{}/test/{}", suite_id, step));
        debug!(%url, "POST test step");
        let envelope: Envelope<StepTestResponse> = self.send_json(self.client.post(url)).await?;
        Ok(envelope.into_inner())
    }

    async fn dataset_preview(&self, dataset_id: Uuid, limit: usize) -> Result<DatasetPreview, BackendError> {
        let url = self.config.endpoint(&format!("/datasets/{}/preview", dataset_id));
        debug!(%url, limit, "GET dataset preview");
        let builder = self.client.get(url).query(&[("limit", limit)]);
        let envelope: Envelope<DatasetPreview> = self.send_json(builder).await?;
        Ok(envelope.into_inner())
    }
}
