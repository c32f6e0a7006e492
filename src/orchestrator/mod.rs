pub mod state;

use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use crate::backend::SuiteBackend;
use crate::error::TestError;
use crate::workflow::{StepName, SuiteId};
use self::state::{TestRun, TestStatus};

/// Result of one passed step inside [`StepTestOrchestrator::test_all_steps`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: StepName,
    pub result: Value,
}

/// Tests pipeline stages against the backend and tracks which stages are unlocked.
///
/// Each step has one [`TestRun`] slot. A step is unlocked once every step before
/// it has been tested and its latest run passed. Two tests of the same step in
/// flight at once both complete; whichever finishes last owns the slot.
pub struct StepTestOrchestrator {
    backend: Arc<dyn SuiteBackend>,
    runs: DashMap<StepName, TestRun>,
    // Only ever grows within a session.
    tested: DashSet<StepName>,
}

impl StepTestOrchestrator {
    pub fn new(backend: Arc<dyn SuiteBackend>) -> Self {
        let runs = DashMap::new();
        for step in StepName::ALL {
            runs.insert(step, TestRun::idle(step));
        }
        Self {
            backend,
            runs,
            tested: DashSet::new(),
        }
    }

    /// Test one step. Fails with [`TestError::NoSuiteSelected`] without touching
    /// any state when there is no suite.
    pub async fn test_step(&self, suite_id: Option<SuiteId>, step: StepName) -> Result<Value, TestError> {
        let suite_id = suite_id.ok_or(TestError::NoSuiteSelected)?;

        self.update_run(step, |run| run.start());
        info!(suite_id = %suite_id, step = %step, "Testing step");

        let outcome = match self.backend.test_step(suite_id, step).await {
            Ok(response) if response.success => {
                serde_json::to_value(&response).map_err(|e| e.to_string())
            }
            Ok(response) => Err(response
                .detail
                .unwrap_or_else(|| "step test reported failure".to_string())),
            Err(e) => Err(e.detail_or_message()),
        };

        match outcome {
            Ok(result) => {
                self.update_run(step, |run| run.succeed(result.clone()));
                self.tested.insert(step);
                info!(suite_id = %suite_id, step = %step, "Step test passed");
                Ok(result)
            }
            Err(message) => {
                warn!(suite_id = %suite_id, step = %step, error = %message, "Step test failed");
                self.update_run(step, |run| run.fail(message.clone()));
                Err(TestError::StepFailed { step, message })
            }
        }
    }

    /// Test every step in pipeline order, stopping at the first failure.
    pub async fn test_all_steps(&self, suite_id: Option<SuiteId>) -> Result<Vec<StepOutcome>, TestError> {
        let mut outcomes = Vec::with_capacity(StepName::ALL.len());
        for step in StepName::ALL {
            let result = self.test_step(suite_id, step).await?;
            outcomes.push(StepOutcome { step, result });
        }
        Ok(outcomes)
    }

    pub fn status_of(&self, step: StepName) -> TestStatus {
        self.run_of(step).status
    }

    pub fn run_of(&self, step: StepName) -> TestRun {
        self.runs
            .get(&step)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| TestRun::idle(step))
    }

    pub fn is_tested(&self, step: StepName) -> bool {
        self.tested.contains(&step)
    }

    /// Whether the editor may configure or test `step`.
    pub fn is_unlocked(&self, step: StepName) -> bool {
        StepName::ALL[..step.index()]
            .iter()
            .all(|prev| self.is_tested(*prev) && self.run_of(*prev).is_success())
    }

    /// Steps that have passed at least once, in pipeline order.
    pub fn tested_steps(&self) -> Vec<StepName> {
        StepName::ALL
            .into_iter()
            .filter(|s| self.is_tested(*s))
            .collect()
    }

    /// Payloads of steps whose latest run passed, in pipeline order.
    pub fn results(&self) -> Vec<StepOutcome> {
        StepName::ALL
            .into_iter()
            .filter_map(|step| {
                let run = self.run_of(step);
                match (run.status, run.result) {
                    (TestStatus::Success, Some(result)) => Some(StepOutcome { step, result }),
                    _ => None,
                }
            })
            .collect()
    }

    /// Forget every run, as a fresh editor session would.
    pub fn reset(&self) {
        for step in StepName::ALL {
            self.runs.insert(step, TestRun::idle(step));
        }
        self.tested.clear();
    }

    fn update_run(&self, step: StepName, f: impl FnOnce(&mut TestRun)) {
        let mut run = self.runs.entry(step).or_insert_with(|| TestRun::idle(step));
        f(run.value_mut());
    }
}
