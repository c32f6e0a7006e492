use crate::workflow::{
    HttpMethod, InvocationInput, KeyValue, Metric, RequestBody, SuiteDefaults, WorkflowConfig,
};

pub struct WorkflowConfigBuilder {
    pub config: WorkflowConfig, // public so tests can poke at fields directly
}

impl WorkflowConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            config: WorkflowConfig::initialize(&SuiteDefaults {
                name: name.to_string(),
                description: String::new(),
            }),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.config.description = description.to_string();
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.config.version = version;
        self
    }

    pub fn input_columns(mut self, columns: &[&str]) -> Self {
        self.config.steps.preprocessing.input.input_columns =
            columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn groundtruth(mut self, column: &str) -> Self {
        self.config.steps.preprocessing.input.groundtruth_column = column.to_string();
        self
    }

    pub fn invocation(self, url: &str) -> InvocationBuilder {
        InvocationBuilder {
            workflow_builder: self,
            input: InvocationInput {
                url: url.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn field(mut self, path: &str) -> Self {
        self.config.steps.postprocessing.input.field = path.to_string();
        self
    }

    /// Replaces the default metric list on first use.
    pub fn metrics(mut self, metrics: &[Metric]) -> Self {
        self.config.steps.evaluation.input.metrics = Vec::new();
        for metric in metrics {
            self.config = self.config.add_metric(*metric);
        }
        self
    }

    pub fn build(self) -> WorkflowConfig {
        self.config
    }
}

pub struct InvocationBuilder {
    workflow_builder: WorkflowConfigBuilder,
    input: InvocationInput,
}

impl InvocationBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.input.method = method;
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.input.headers.push(KeyValue::new(key, value));
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.input.input_type.params.push(KeyValue::new(key, value));
        self
    }

    /// Adds a JSON body entry. Switches the body to JSON if it was form-encoded.
    pub fn json(mut self, key: &str, value: &str) -> Self {
        let entry = KeyValue::new(key, value);
        match &mut self.input.input_type.body {
            RequestBody::Json(entries) => entries.push(entry),
            body => *body = RequestBody::Json(vec![entry]),
        }
        self
    }

    /// Adds a form body entry. Switches the body to form if it was JSON.
    pub fn form(mut self, key: &str, value: &str) -> Self {
        let entry = KeyValue::new(key, value);
        match &mut self.input.input_type.body {
            RequestBody::Form(entries) => entries.push(entry),
            body => *body = RequestBody::Form(vec![entry]),
        }
        self
    }

    pub fn build(mut self) -> WorkflowConfigBuilder {
        self.workflow_builder.config.steps.invocation.input = self.input;
        self.workflow_builder
    }
}
