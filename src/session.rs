//! One open "Edit Configuration" editor.
//!
//! The session owns the draft and routes edits, tests and saves through the
//! orchestrator and gateway. Remote failures never escape: each one becomes
//! a [`Notification`] the user can dismiss.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use crate::backend::{SuiteBackend, SuiteRecord};
use crate::gateway::ConfigPersistenceGateway;
use crate::orchestrator::state::{TestRun, TestStatus};
use crate::orchestrator::{StepOutcome, StepTestOrchestrator};
use crate::workflow::{InvocationInput, Metric, StepName, SuiteDefaults, SuiteId, WorkflowConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

pub struct EditorSession {
    suite_id: Option<SuiteId>,
    suite: Option<SuiteRecord>,
    draft: WorkflowConfig,
    orchestrator: StepTestOrchestrator,
    gateway: ConfigPersistenceGateway,
    notifications: Vec<Notification>,
}

impl EditorSession {
    /// Open the editor for `suite_id`, loading its configuration or starting a
    /// draft when it has none. Load failures leave an empty draft and a notification.
    pub async fn open(backend: Arc<dyn SuiteBackend>, suite_id: Option<SuiteId>) -> Self {
        let mut session = Self {
            suite_id,
            suite: None,
            draft: WorkflowConfig::initialize(&SuiteDefaults::default()),
            orchestrator: StepTestOrchestrator::new(backend.clone()),
            gateway: ConfigPersistenceGateway::new(backend.clone()),
            notifications: Vec::new(),
        };

        let Some(id) = suite_id else {
            return session;
        };

        match backend.get_suite(id).await {
            Ok(suite) => session.suite = Some(suite),
            Err(e) => {
                session.notify(NotificationLevel::Error, format!("Failed to load suite data: {}", e));
                return session;
            }
        }

        let defaults = session
            .suite
            .as_ref()
            .map(SuiteRecord::defaults)
            .unwrap_or_default();
        match session.gateway.load_or_initialize(id, &defaults).await {
            Ok(config) => session.draft = config,
            Err(e) => {
                session.draft = WorkflowConfig::initialize(&defaults);
                session.notify(NotificationLevel::Error, e.to_string());
            }
        }
        session
    }

    pub fn suite_id(&self) -> Option<SuiteId> {
        self.suite_id
    }

    pub fn suite(&self) -> Option<&SuiteRecord> {
        self.suite.as_ref()
    }

    pub fn draft(&self) -> &WorkflowConfig {
        &self.draft
    }

    pub fn orchestrator(&self) -> &StepTestOrchestrator {
        &self.orchestrator
    }

    pub fn gateway(&self) -> &ConfigPersistenceGateway {
        &self.gateway
    }

    pub fn is_unlocked(&self, step: StepName) -> bool {
        self.orchestrator.is_unlocked(step)
    }

    pub fn status_of(&self, step: StepName) -> TestStatus {
        self.orchestrator.status_of(step)
    }

    pub fn run_of(&self, step: StepName) -> TestRun {
        self.orchestrator.run_of(step)
    }

    // --- Editing ---

    /// Apply `edit` to the draft if `step` is unlocked.
    fn edit(&mut self, step: StepName, edit: impl FnOnce(&WorkflowConfig) -> WorkflowConfig) -> bool {
        if !self.orchestrator.is_unlocked(step) {
            debug!(step = %step, "Edit refused, step is locked");
            let blocker = step.previous().map(|p| p.to_string()).unwrap_or_default();
            self.notify(
                NotificationLevel::Info,
                format!("Test the {} step before configuring {}", blocker, step),
            );
            return false;
        }
        self.draft = edit(&self.draft);
        true
    }

    pub fn update_step_field(&mut self, step: StepName, field: &str, value: Value) -> bool {
        self.edit(step, |draft| draft.update_step_field(step, field, value))
    }

    pub fn set_input_columns(&mut self, columns: Vec<String>) -> bool {
        self.edit(StepName::Preprocessing, |draft| draft.set_input_columns(columns))
    }

    pub fn set_groundtruth_column(&mut self, column: &str) -> bool {
        self.edit(StepName::Preprocessing, |draft| draft.set_groundtruth_column(column))
    }

    pub fn set_invocation(&mut self, input: InvocationInput) -> bool {
        self.edit(StepName::Invocation, |draft| draft.set_invocation(input))
    }

    pub fn set_field_path(&mut self, path: &str) -> bool {
        self.edit(StepName::Postprocessing, |draft| draft.set_field_path(path))
    }

    pub fn add_metric(&mut self, metric: Metric) -> bool {
        self.edit(StepName::Evaluation, |draft| draft.add_metric(metric))
    }

    pub fn remove_metric(&mut self, metric: Metric) -> bool {
        self.edit(StepName::Evaluation, |draft| draft.remove_metric(metric))
    }

    // --- Testing ---

    /// Test one unlocked step. Returns the payload on success.
    pub async fn test_step(&mut self, step: StepName) -> Option<Value> {
        if !self.orchestrator.is_unlocked(step) {
            self.notify(NotificationLevel::Info, format!("The {} step is locked", step));
            return None;
        }
        if step == StepName::Invocation && !self.require_invocation_url() {
            return None;
        }

        match self.orchestrator.test_step(self.suite_id, step).await {
            Ok(result) => {
                self.notify(NotificationLevel::Success, format!("{} test passed", step));
                Some(result)
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, e.to_string());
                None
            }
        }
    }

    /// Test every step in order, stopping at the first failure. Nothing is sent
    /// when the invocation URL is empty.
    pub async fn test_all_steps(&mut self) -> Option<Vec<StepOutcome>> {
        if self.suite_id.is_some() && !self.require_invocation_url() {
            return None;
        }

        match self.orchestrator.test_all_steps(self.suite_id).await {
            Ok(outcomes) => {
                self.notify(NotificationLevel::Success, "All steps passed".to_string());
                Some(outcomes)
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, e.to_string());
                None
            }
        }
    }

    fn require_invocation_url(&mut self) -> bool {
        if self.draft.steps.invocation.input.url.trim().is_empty() {
            self.notify(NotificationLevel::Error, "Invocation URL is required".to_string());
            return false;
        }
        true
    }

    // --- Persistence ---

    /// Save the draft as the suite's next version. On failure the draft is kept
    /// as is, so saving again is the retry.
    pub async fn save(&mut self) -> Option<u32> {
        let Some(suite_id) = self.suite_id else {
            self.notify(NotificationLevel::Error, "no suite selected".to_string());
            return None;
        };

        match self.gateway.save(suite_id, &self.draft).await {
            Ok(version) => {
                self.draft.version = version;
                if let Some(suite) = self.suite.as_mut() {
                    suite.current_config_version = version;
                    suite.latest_config_version = suite.latest_config_version.max(version);
                }
                info!(suite_id = %suite_id, version, "Workflow configuration saved");
                self.notify(NotificationLevel::Success, format!("Saved configuration version {}", version));
                Some(version)
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, e.to_string());
                None
            }
        }
    }

    // --- Notifications ---

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn dismiss_notification(&mut self, index: usize) -> Option<Notification> {
        (index < self.notifications.len()).then(|| self.notifications.remove(index))
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        self.notifications.push(Notification { level, message });
    }
}
