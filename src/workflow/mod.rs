pub mod builder;
pub mod columns;
pub mod edit;
pub mod loader;
pub mod projection;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type SuiteId = Uuid;

/// One of the four fixed pipeline stages, declared in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepName {
    Preprocessing,
    Invocation,
    Postprocessing,
    Evaluation,
}

impl StepName {
    pub const ALL: [StepName; 4] = [
        StepName::Preprocessing,
        StepName::Invocation,
        StepName::Postprocessing,
        StepName::Evaluation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Preprocessing => "preprocessing",
            StepName::Invocation => "invocation",
            StepName::Postprocessing => "postprocessing",
            StepName::Evaluation => "evaluation",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The stage that must pass before this one unlocks.
    pub fn previous(&self) -> Option<StepName> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn next(&self) -> Option<StepName> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepName::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown step `{}`", s))
    }
}

/// `{key, value, enabled}` triple used by headers, query params and bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("Invalid HTTP method: {}", other)),
        }
    }
}

/// Request body of the invocation step. Only one encoding is ever populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    None,
    Json(Vec<KeyValue>),
    Form(Vec<KeyValue>),
}

/// `input_type` of the invocation step.
///
/// On the wire this is `{ "params"?: {"data": [...]}, "body"?: {"json"?: [...], "form"?: [...]} }`.
/// An empty parameter list is written without the `params` key. A body carrying
/// both encodings is read as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "InputTypeWire", into = "InputTypeWire")]
pub struct InputType {
    pub params: Vec<KeyValue>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InputTypeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<ParamsWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<BodyWire>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ParamsWire {
    #[serde(default)]
    data: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BodyWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    json: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    form: Option<Vec<KeyValue>>,
}

impl From<InputTypeWire> for InputType {
    fn from(wire: InputTypeWire) -> Self {
        let params = wire.params.map(|p| p.data).unwrap_or_default();
        let body = match wire.body {
            Some(BodyWire { json: Some(json), .. }) => RequestBody::Json(json),
            Some(BodyWire { form: Some(form), .. }) => RequestBody::Form(form),
            _ => RequestBody::None,
        };
        Self { params, body }
    }
}

impl From<InputType> for InputTypeWire {
    fn from(input: InputType) -> Self {
        let params = if input.params.is_empty() {
            None
        } else {
            Some(ParamsWire { data: input.params })
        };
        let body = match input.body {
            RequestBody::None => None,
            RequestBody::Json(json) => Some(BodyWire { json: Some(json), form: None }),
            RequestBody::Form(form) => Some(BodyWire { json: None, form: Some(form) }),
        };
        Self { params, body }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreprocessingInput {
    #[serde(default)]
    pub input_columns: Vec<String>,
    #[serde(default)]
    pub groundtruth_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvocationInput {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub input_type: InputType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostprocessingInput {
    /// Path into the invocation response, e.g. `result[0].text`.
    #[serde(default)]
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    #[serde(default)]
    pub metrics: Vec<String>,
}

/// Metric catalog offered by the evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Similarity,
    Accuracy,
    Precision,
    Recall,
    Relevancy,
    Hallucination,
    Coherence,
    Fluency,
    SemanticSimilarity,
    ResponseTime,
}

impl Metric {
    pub const CATALOG: [Metric; 10] = [
        Metric::Similarity,
        Metric::Accuracy,
        Metric::Precision,
        Metric::Recall,
        Metric::Relevancy,
        Metric::Hallucination,
        Metric::Coherence,
        Metric::Fluency,
        Metric::SemanticSimilarity,
        Metric::ResponseTime,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Metric::Similarity => "similarity",
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::Relevancy => "relevancy",
            Metric::Hallucination => "hallucination",
            Metric::Coherence => "coherence",
            Metric::Fluency => "fluency",
            Metric::SemanticSimilarity => "semantic-similarity",
            Metric::ResponseTime => "response-time",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.id())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::CATALOG
            .into_iter()
            .find(|m| m.id() == s)
            .ok_or_else(|| format!("unknown metric `{}`", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowStep<I> {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub input: I,
}

impl<I> WorkflowStep<I> {
    fn new(description: &str, script: &str, input: I) -> Self {
        Self {
            description: description.to_string(),
            script: script.to_string(),
            input,
        }
    }
}

/// The four stages. A struct rather than a map so a step can never be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSteps {
    pub preprocessing: WorkflowStep<PreprocessingInput>,
    pub invocation: WorkflowStep<InvocationInput>,
    pub postprocessing: WorkflowStep<PostprocessingInput>,
    pub evaluation: WorkflowStep<EvaluationInput>,
}

impl Default for WorkflowSteps {
    fn default() -> Self {
        Self {
            preprocessing: WorkflowStep::new(
                "Select input and ground truth columns",
                "preprocessing.py",
                PreprocessingInput::default(),
            ),
            invocation: WorkflowStep::new(
                "Call the target API",
                "invocation.py",
                InvocationInput::default(),
            ),
            postprocessing: WorkflowStep::new(
                "Extract the output field",
                "postprocessing.py",
                PostprocessingInput::default(),
            ),
            evaluation: WorkflowStep::new(
                "Score the output",
                "evaluation.py",
                EvaluationInput {
                    metrics: vec![Metric::Similarity.id().to_string()],
                },
            ),
        }
    }
}

/// Name and description a fresh draft is seeded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteDefaults {
    pub name: String,
    pub description: String,
}

/// Workflow configuration of a suite. `version == 0` is an unsaved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: u32,
    pub steps: WorkflowSteps,
}

impl WorkflowConfig {
    /// Draft seeded from the suite, with neutral defaults for every step.
    pub fn initialize(defaults: &SuiteDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            description: defaults.description.clone(),
            version: 0,
            steps: WorkflowSteps::default(),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.version == 0
    }

    pub fn step_description(&self, step: StepName) -> &str {
        match step {
            StepName::Preprocessing => &self.steps.preprocessing.description,
            StepName::Invocation => &self.steps.invocation.description,
            StepName::Postprocessing => &self.steps.postprocessing.description,
            StepName::Evaluation => &self.steps.evaluation.description,
        }
    }

    pub fn into_document(self) -> WorkflowDocument {
        WorkflowDocument { workflow: self }
    }
}

/// Canonical JSON document: `{"workflow": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub workflow: WorkflowConfig,
}
