use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use crate::workflow::{HttpMethod, InvocationInput, KeyValue, RequestBody};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("invocation URL is empty")]
    MissingUrl,

    #[error("invalid invocation URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedBody {
    None,
    Json(Map<String, Value>),
    Form(Vec<(String, String)>),
}

/// The request one dataset row turns into.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RenderedBody,
}

impl RenderedRequest {
    pub fn to_builder(&self, client: &Client) -> RequestBuilder {
        let mut builder = client.request(self.method.as_reqwest(), self.url.clone());
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        match &self.body {
            RenderedBody::None => builder,
            RenderedBody::Json(map) => builder.json(map),
            RenderedBody::Form(pairs) => builder.form(pairs),
        }
    }

    /// Send the request and decode its JSON body. A non-success status is an error.
    pub async fn send(&self, client: &Client) -> Result<Value, reqwest::Error> {
        let response = self.to_builder(client).send().await?;
        debug!(url = %self.url, status = %response.status(), "Invocation response");
        response.error_for_status()?.json().await
    }
}

/// Resolve an `@[column]` reference against a row.
///
/// The column is looked up under `row.input` first, then at the top of the
/// row. Anything that is not exactly `@[...]`, or names a missing column,
/// comes back as the literal string.
pub fn interpolate(value: &str, row: &Value) -> Value {
    let Some(name) = value.strip_prefix("@[").and_then(|rest| rest.strip_suffix(']')) else {
        return Value::String(value.to_string());
    };

    row.get("input")
        .and_then(|input| input.get(name))
        .or_else(|| row.get(name))
        .cloned()
        .unwrap_or_else(|| Value::String(value.to_string()))
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn enabled(entries: &[KeyValue]) -> impl Iterator<Item = &KeyValue> {
    entries.iter().filter(|kv| kv.enabled)
}

/// Build the outbound request for `row`. Disabled entries are dropped.
pub fn render_request(input: &InvocationInput, row: &Value) -> Result<RenderedRequest, RenderError> {
    if input.url.trim().is_empty() {
        return Err(RenderError::MissingUrl);
    }

    let mut url = Url::parse(input.url.trim()).map_err(|e| RenderError::InvalidUrl {
        url: input.url.clone(),
        reason: e.to_string(),
    })?;

    let params: Vec<(String, String)> = enabled(&input.input_type.params)
        .map(|kv| (kv.key.clone(), as_text(interpolate(&kv.value, row))))
        .collect();
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }

    let headers = enabled(&input.headers)
        .map(|kv| (kv.key.clone(), as_text(interpolate(&kv.value, row))))
        .collect();

    let body = match &input.input_type.body {
        RequestBody::None => RenderedBody::None,
        RequestBody::Json(entries) => RenderedBody::Json(
            enabled(entries)
                .map(|kv| (kv.key.clone(), interpolate(&kv.value, row)))
                .collect(),
        ),
        RequestBody::Form(entries) => RenderedBody::Form(
            enabled(entries)
                .map(|kv| (kv.key.clone(), as_text(interpolate(&kv.value, row))))
                .collect(),
        ),
    };

    Ok(RenderedRequest {
        method: input.method,
        url,
        headers,
        body,
    })
}
