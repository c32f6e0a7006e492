//! Step-scoped edits on a [`WorkflowConfig`].
//!
//! Every edit returns a new config and leaves the receiver alone, so one edit
//! is one whole-value replace for whoever holds the draft. Edits that do not
//! fit the target step are dropped.

use crate::workflow::{InvocationInput, Metric, StepName, WorkflowConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

impl WorkflowConfig {
    /// Replace one key under `steps[step].input`.
    ///
    /// `field` names a key of the step input. For the invocation step it may
    /// also be a dotted path into `input_type` (`input_type.body`), since
    /// that input is nested where the others are flat. Only the target key is
    /// replaced; siblings keep their values.
    pub fn update_step_field(&self, step: StepName, field: &str, value: Value) -> WorkflowConfig {
        let mut next = self.clone();
        let applied = match step {
            StepName::Preprocessing => {
                replace_key(&mut next.steps.preprocessing.input, field, value, false)
            }
            StepName::Invocation => {
                replace_key(&mut next.steps.invocation.input, field, value, true)
            }
            StepName::Postprocessing => {
                replace_key(&mut next.steps.postprocessing.input, field, value, false)
            }
            StepName::Evaluation => {
                replace_key(&mut next.steps.evaluation.input, field, value, false)
            }
        };

        if !applied {
            debug!(step = %step, field, "Ignoring edit that does not fit the step input");
            return self.clone();
        }
        next
    }

    pub fn set_input_columns(&self, columns: Vec<String>) -> WorkflowConfig {
        self.update_step_field(StepName::Preprocessing, "input_columns", Value::from(columns))
    }

    pub fn set_groundtruth_column(&self, column: &str) -> WorkflowConfig {
        self.update_step_field(StepName::Preprocessing, "groundtruth_column", Value::from(column))
    }

    pub fn set_field_path(&self, path: &str) -> WorkflowConfig {
        self.update_step_field(StepName::Postprocessing, "field", Value::from(path))
    }

    pub fn set_invocation(&self, input: InvocationInput) -> WorkflowConfig {
        let mut next = self.clone();
        next.steps.invocation.input = input;
        next
    }

    /// Append a metric unless it is already selected.
    pub fn add_metric(&self, metric: Metric) -> WorkflowConfig {
        let metrics = &self.steps.evaluation.input.metrics;
        if metrics.iter().any(|m| m == metric.id()) {
            return self.clone();
        }
        let mut updated = metrics.clone();
        updated.push(metric.id().to_string());
        self.update_step_field(StepName::Evaluation, "metrics", Value::from(updated))
    }

    pub fn remove_metric(&self, metric: Metric) -> WorkflowConfig {
        let updated: Vec<String> = self
            .steps
            .evaluation
            .input
            .metrics
            .iter()
            .filter(|m| m.as_str() != metric.id())
            .cloned()
            .collect();
        self.update_step_field(StepName::Evaluation, "metrics", Value::from(updated))
    }

    /// Columns that can be referenced as `@[column]` in invocation values.
    pub fn mention_candidates(&self) -> &[String] {
        &self.steps.preprocessing.input.input_columns
    }
}

/// Round-trips `input` through JSON, swapping the value at `field`.
/// Returns `false` (leaving `input` untouched) when the key is unknown or the
/// new value does not deserialize into the input type.
fn replace_key<I>(input: &mut I, field: &str, value: Value, nested: bool) -> bool
where
    I: Serialize + DeserializeOwned,
{
    let Ok(mut raw) = serde_json::to_value(&*input) else {
        return false;
    };

    let mut segments: Vec<&str> = field.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) || (!nested && segments.len() > 1) {
        return false;
    }
    let Some(last) = segments.pop() else {
        return false;
    };

    let mut parent = &mut raw;
    for (depth, segment) in segments.iter().enumerate() {
        let Some(obj) = parent.as_object_mut() else {
            return false;
        };
        // The top level must already have the key; below it optional
        // objects such as `input_type.params` may be absent on the wire.
        if depth == 0 && !obj.contains_key(*segment) {
            return false;
        }
        parent = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }

    let Some(obj) = parent.as_object_mut() else {
        return false;
    };
    if segments.is_empty() && !obj.contains_key(last) {
        return false;
    }
    obj.insert(last.to_string(), value);

    match serde_json::from_value::<I>(raw) {
        Ok(updated) => {
            *input = updated;
            true
        }
        Err(_) => false,
    }
}
