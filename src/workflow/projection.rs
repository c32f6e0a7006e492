//! Flat editing view of [`InvocationInput`].
//!
//! The form editor works on `{url, method, params, bodyType, body: {json, formData}}`.
//! This is a view model only; the nested [`InvocationInput`] stays the source of
//! truth and `unproject(project(x)) == x` holds for every input.

use crate::workflow::{HttpMethod, InputType, InvocationInput, KeyValue, RequestBody};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyType {
    #[default]
    None,
    Json,
    FormData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyBody {
    #[serde(default)]
    pub json: Vec<KeyValue>,
    #[serde(default, rename = "formData")]
    pub form_data: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyInvocation {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub params: Vec<KeyValue>,
    #[serde(rename = "bodyType", default)]
    pub body_type: BodyType,
    #[serde(default)]
    pub body: LegacyBody,
}

impl LegacyInvocation {
    /// Switch the body encoding. Entries typed under the other encoding are kept
    /// in the view but are not part of the canonical value.
    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }
}

pub fn body_type_of(body: &RequestBody) -> BodyType {
    match body {
        RequestBody::None => BodyType::None,
        RequestBody::Json(_) => BodyType::Json,
        RequestBody::Form(_) => BodyType::FormData,
    }
}

pub fn project(input: &InvocationInput) -> LegacyInvocation {
    let mut body = LegacyBody::default();
    match &input.input_type.body {
        RequestBody::None => {}
        RequestBody::Json(json) => body.json = json.clone(),
        RequestBody::Form(form) => body.form_data = form.clone(),
    }

    LegacyInvocation {
        url: input.url.clone(),
        method: input.method,
        headers: input.headers.clone(),
        params: input.input_type.params.clone(),
        body_type: body_type_of(&input.input_type.body),
        body,
    }
}

/// Rebuild the canonical input. Only the branch named by `body_type` survives;
/// `BodyType::None` yields no body at all.
pub fn unproject(legacy: &LegacyInvocation) -> InvocationInput {
    let body = match legacy.body_type {
        BodyType::None => RequestBody::None,
        BodyType::Json => RequestBody::Json(legacy.body.json.clone()),
        BodyType::FormData => RequestBody::Form(legacy.body.form_data.clone()),
    };

    InvocationInput {
        url: legacy.url.clone(),
        method: legacy.method,
        headers: legacy.headers.clone(),
        input_type: InputType {
            params: legacy.params.clone(),
            body,
        },
    }
}
