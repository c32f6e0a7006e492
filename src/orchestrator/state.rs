use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::workflow::StepName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Idle,
    Running,
    Success,
    Failure,
}

/// Latest test of one step. Not persisted.
///
/// `Idle → Running → Success | Failure`, and back to `Running` on retest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub step: StepName,
    pub status: TestStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl TestRun {
    pub fn idle(step: StepName) -> Self {
        Self {
            step,
            status: TestStatus::Idle,
            result: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = TestStatus::Running;
        self.result = None;
        self.error = None;
    }

    pub fn succeed(&mut self, result: Value) {
        self.status = TestStatus::Success;
        self.result = Some(result);
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.status = TestStatus::Failure;
        self.result = None;
        self.error = Some(message);
    }

    pub fn is_success(&self) -> bool {
        self.status == TestStatus::Success
    }
}
