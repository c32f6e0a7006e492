use evangelist::invocation::{
    FieldPath, FieldPathError, PathSegment, RenderError, RenderedBody, interpolate, render_request,
};
use evangelist::workflow::{HttpMethod, InputType, InvocationInput, KeyValue, RequestBody};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn classify_input(url: &str, body: RequestBody) -> InvocationInput {
    InvocationInput {
        url: url.to_string(),
        method: HttpMethod::Post,
        headers: vec![
            KeyValue::new("Authorization", "Bearer secret"),
            KeyValue::new("X-Debug", "1").disabled(),
        ],
        input_type: InputType {
            params: vec![KeyValue::new("lang", "@[lang]"), KeyValue::new("skip", "x").disabled()],
            body,
        },
    }
}

fn row() -> serde_json::Value {
    json!({
        "input": {"review_text": "Arrived broken", "stars": 1},
        "lang": "en",
        "groundtruth": "negative"
    })
}

#[test]
fn test_render_json_body() {
    let input = classify_input(
        "https://api.example.com/classify?model=v2",
        RequestBody::Json(vec![
            KeyValue::new("text", "@[review_text]"),
            KeyValue::new("stars", "@[stars]"),
            KeyValue::new("source", "evangelist"),
            KeyValue::new("ignored", "@[review_text]").disabled(),
        ]),
    );

    let request = render_request(&input, &row()).unwrap();

    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url.as_str(), "https://api.example.com/classify?model=v2&lang=en");
    assert_eq!(request.headers, vec![("Authorization".to_string(), "Bearer secret".to_string())]);
    match request.body {
        RenderedBody::Json(map) => {
            assert_eq!(
                serde_json::Value::Object(map),
                json!({"text": "Arrived broken", "stars": 1, "source": "evangelist"})
            );
        }
        other => panic!("expected a JSON body, got {:?}", other),
    }
}

#[test]
fn test_render_form_body_stringifies_values() {
    let input = classify_input(
        "https://api.example.com/classify",
        RequestBody::Form(vec![
            KeyValue::new("text", "@[review_text]"),
            KeyValue::new("stars", "@[stars]"),
            KeyValue::new("missing", "@[not_a_column]"),
        ]),
    );

    let request = render_request(&input, &row()).unwrap();

    assert_eq!(
        request.body,
        RenderedBody::Form(vec![
            ("text".to_string(), "Arrived broken".to_string()),
            ("stars".to_string(), "1".to_string()),
            ("missing".to_string(), "@[not_a_column]".to_string()),
        ])
    );
}

#[test]
fn test_render_rejects_bad_urls() {
    let mut input = classify_input("   ", RequestBody::None);
    assert_eq!(render_request(&input, &row()), Err(RenderError::MissingUrl));

    input.url = "not a url".to_string();
    assert!(matches!(render_request(&input, &row()), Err(RenderError::InvalidUrl { .. })));
}

#[tokio::test]
async fn test_rendered_request_reaches_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/classify"))
        .and(query_param("lang", "en"))
        .and(header("Authorization", "Bearer secret"))
        .and(body_json(json!({"text": "Arrived broken"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"label": "negative", "score": 0.97}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut input = classify_input(
        &format!("{}/classify", server.uri()),
        RequestBody::Json(vec![KeyValue::new("text", "@[review_text]")]),
    );
    input.method = HttpMethod::Put;

    let request = render_request(&input, &row()).unwrap();
    let response = request.send(&reqwest::Client::new()).await.unwrap();

    let field = FieldPath::parse("result[0].label").unwrap();
    assert_eq!(field.extract(&response).unwrap(), &json!("negative"));
}

#[tokio::test]
async fn test_error_status_is_not_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "model offline"})))
        .mount(&server)
        .await;

    let input = classify_input(&format!("{}/classify", server.uri()), RequestBody::None);
    let err = render_request(&input, &row())
        .unwrap()
        .send(&reqwest::Client::new())
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn test_undecodable_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let input = classify_input(&format!("{}/classify", server.uri()), RequestBody::None);
    let err = render_request(&input, &row())
        .unwrap()
        .send(&reqwest::Client::new())
        .await
        .unwrap_err();

    assert!(err.is_decode());
}

#[test]
fn test_interpolate_prefers_input_section() {
    let row = json!({"input": {"text": "nested"}, "text": "top"});
    assert_eq!(interpolate("@[text]", &row), json!("nested"));

    let flat = json!({"text": "top", "score": 3});
    assert_eq!(interpolate("@[score]", &flat), json!(3));
    assert_eq!(interpolate("@[missing]", &flat), json!("@[missing]"));
    assert_eq!(interpolate("plain @[text]", &flat), json!("plain @[text]"));
}

#[test]
fn test_missing_url() {
    let input = InvocationInput::default();
    assert_eq!(render_request(&input, &json!({})), Err(RenderError::MissingUrl));
}

#[test]
fn test_parse_bracket_and_dot() {
    let path = FieldPath::parse("result[0].text").unwrap();
    assert_eq!(
        path.segments(),
        &[
            PathSegment::Key("result".to_string()),
            PathSegment::Index(0),
            PathSegment::Key("text".to_string()),
        ]
    );
}

#[test]
fn test_parse_rejects_malformed() {
    for bad in ["a..b", ".a", "a.", "a[", "a[x]", "a[]", "a]", "a[0]b"] {
        assert!(FieldPath::parse(bad).is_err(), "{} should be rejected", bad);
    }
    assert!(FieldPath::parse("").unwrap().segments().is_empty());
}

#[test]
fn test_extract() {
    let response = json!({"result": [{"text": "positive"}], "choices": ["a", "b"]});

    let text = FieldPath::parse("result[0].text").unwrap();
    assert_eq!(text.extract(&response), Ok(&json!("positive")));

    let numeric = FieldPath::parse("choices.1").unwrap();
    assert_eq!(numeric.extract(&response), Ok(&json!("b")));

    let whole = FieldPath::parse("").unwrap();
    assert_eq!(whole.extract(&response), Ok(&response));
}

#[test]
fn test_extract_errors() {
    let response = json!({"result": [{"text": "positive"}]});

    assert_eq!(
        FieldPath::parse("result[3]").unwrap().extract(&response),
        Err(FieldPathError::IndexOutOfRange { index: 3, len: 1 })
    );
    assert_eq!(
        FieldPath::parse("output").unwrap().extract(&response),
        Err(FieldPathError::MissingKey("output".to_string()))
    );
    assert_eq!(
        FieldPath::parse("result[0].text.value").unwrap().extract(&response),
        Err(FieldPathError::NotAContainer { segment: "value".to_string(), kind: "string" })
    );
}
