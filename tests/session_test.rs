use evangelist::backend::SuiteRecord;
use evangelist::backend::memory::{InMemorySuiteBackend, StepScript};
use evangelist::orchestrator::state::TestStatus;
use evangelist::session::{EditorSession, NotificationLevel};
use evangelist::workflow::builder::WorkflowConfigBuilder;
use evangelist::workflow::{InvocationInput, Metric, StepName};
use evangelist::SuiteBackend;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn backend_with_suite() -> (Arc<InMemorySuiteBackend>, Uuid) {
    let backend = Arc::new(InMemorySuiteBackend::new());
    let suite_id = Uuid::new_v4();
    let mut suite = SuiteRecord::new(suite_id, "Review classifier");
    suite.description = Some("Classifies product reviews".to_string());
    backend.insert_suite(suite);
    (backend, suite_id)
}

/// A suite whose saved configuration already points at an endpoint.
async fn backend_with_endpoint() -> (Arc<InMemorySuiteBackend>, Uuid) {
    let (backend, suite_id) = backend_with_suite();
    let config = WorkflowConfigBuilder::new("Review classifier")
        .input_columns(&["review_text"])
        .invocation("https://api.example.com/classify")
            .json("text", "@[review_text]")
            .build()
        .field("result")
        .build();
    backend.put_config(suite_id, &config).await.unwrap();
    (backend, suite_id)
}

fn endpoint() -> InvocationInput {
    InvocationInput {
        url: "https://api.example.com/classify".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_open_without_config_starts_draft() {
    let (backend, suite_id) = backend_with_suite();

    let session = EditorSession::open(backend, Some(suite_id)).await;

    assert!(session.notifications().is_empty());
    assert_eq!(session.suite_id(), Some(suite_id));
    assert_eq!(session.draft().version, 0);
    assert_eq!(session.draft().name, "Review classifier");
    assert_eq!(session.draft().description, "Classifies product reviews");
    assert_eq!(session.status_of(StepName::Preprocessing), TestStatus::Idle);
}

#[tokio::test]
async fn test_open_loads_saved_config() {
    let (backend, suite_id) = backend_with_suite();
    let saved = WorkflowConfigBuilder::new("Review classifier")
        .input_columns(&["review_text"])
        .build();
    {
        let session = EditorSession::open(backend.clone(), Some(suite_id)).await;
        session.gateway().save(suite_id, &saved).await.unwrap();
    }

    let session = EditorSession::open(backend, Some(suite_id)).await;

    assert_eq!(session.draft().version, 1);
    assert_eq!(session.draft().steps.preprocessing.input.input_columns, vec!["review_text"]);
    assert_eq!(session.gateway().known_version(suite_id), Some(1));
    // tested state does not survive a reopen
    assert!(!session.is_unlocked(StepName::Invocation));
}

#[tokio::test]
async fn test_open_unknown_suite_notifies() {
    let backend = Arc::new(InMemorySuiteBackend::new());

    let session = EditorSession::open(backend, Some(Uuid::new_v4())).await;

    let notes = session.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert!(notes[0].message.starts_with("Failed to load suite data"));
    assert!(session.suite().is_none());
}

#[tokio::test]
async fn test_open_with_failing_config_load_keeps_a_draft() {
    let (backend, suite_id) = backend_with_suite();
    backend.fail_loads(Some("database unavailable")).await;

    let session = EditorSession::open(backend, Some(suite_id)).await;

    assert_eq!(session.draft().name, "Review classifier");
    assert_eq!(session.notifications().len(), 1);
    assert!(session.notifications()[0].message.contains("database unavailable"));
}

#[tokio::test]
async fn test_locked_steps_refuse_edits() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend, Some(suite_id)).await;
    let before = session.draft().clone();

    assert!(!session.set_invocation(endpoint()));
    assert!(!session.set_field_path("result"));
    assert!(!session.add_metric(Metric::Accuracy));
    assert!(!session.update_step_field(StepName::Evaluation, "metrics", json!(["recall"])));

    assert_eq!(session.draft(), &before);
    assert_eq!(session.notifications().len(), 4);
    assert_eq!(
        session.notifications()[0].message,
        "Test the preprocessing step before configuring invocation"
    );
    assert!(session.notifications().iter().all(|n| n.level == NotificationLevel::Info));
}

#[tokio::test]
async fn test_edits_follow_successful_tests() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend, Some(suite_id)).await;

    assert!(session.set_input_columns(vec!["review_text".to_string()]));
    assert!(session.set_groundtruth_column("category"));
    assert!(session.test_step(StepName::Preprocessing).await.is_some());

    assert!(session.set_invocation(endpoint()));
    assert!(session.update_step_field(StepName::Invocation, "method", json!("PUT")));
    assert!(session.test_step(StepName::Invocation).await.is_some());
    assert!(session.test_step(StepName::Postprocessing).await.is_some());

    assert!(session.add_metric(Metric::Accuracy));
    assert!(session.remove_metric(Metric::Similarity));

    let draft = session.draft();
    assert_eq!(draft.steps.preprocessing.input.groundtruth_column, "category");
    assert_eq!(draft.steps.invocation.input.url, "https://api.example.com/classify");
    assert_eq!(draft.steps.evaluation.input.metrics, vec!["accuracy"]);
    assert_eq!(
        session.notifications().last().map(|n| n.message.as_str()),
        Some("postprocessing test passed")
    );
}

#[tokio::test]
async fn test_invocation_needs_a_url() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend.clone(), Some(suite_id)).await;
    session.test_step(StepName::Preprocessing).await;

    assert!(session.test_step(StepName::Invocation).await.is_none());

    let last = session.notifications().last().unwrap();
    assert_eq!(last.level, NotificationLevel::Error);
    assert_eq!(last.message, "Invocation URL is required");
    assert_eq!(backend.step_calls().await.len(), 1);
}

#[tokio::test]
async fn test_locked_step_test_is_refused() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend.clone(), Some(suite_id)).await;

    assert!(session.test_step(StepName::Evaluation).await.is_none());
    assert_eq!(session.notifications()[0].message, "The evaluation step is locked");
    assert!(backend.step_calls().await.is_empty());
}

#[tokio::test]
async fn test_failed_step_is_reported() {
    let (backend, suite_id) = backend_with_endpoint().await;
    backend.script_step(StepName::Preprocessing, StepScript::Reject("column 'rating' not in dataset".to_string()));
    let mut session = EditorSession::open(backend, Some(suite_id)).await;

    assert!(session.test_all_steps().await.is_none());

    let last = session.notifications().last().unwrap();
    assert_eq!(last.level, NotificationLevel::Error);
    assert!(last.message.contains("column 'rating' not in dataset"));
    assert_eq!(session.status_of(StepName::Preprocessing), TestStatus::Failure);
    assert_eq!(session.run_of(StepName::Preprocessing).error.as_deref(), Some("column 'rating' not in dataset"));
}

#[tokio::test]
async fn test_no_suite_selected() {
    let backend = Arc::new(InMemorySuiteBackend::new());
    let mut session = EditorSession::open(backend.clone(), None).await;

    assert!(session.test_step(StepName::Preprocessing).await.is_none());
    assert!(session.save().await.is_none());

    let messages: Vec<&str> = session.notifications().iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, vec!["no suite selected", "no suite selected"]);
    assert!(backend.step_calls().await.is_empty());
}

#[tokio::test]
async fn test_save_failure_keeps_draft_and_retry_succeeds() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend.clone(), Some(suite_id)).await;
    session.set_input_columns(vec!["review_text".to_string()]);
    let edited = session.draft().clone();

    backend.fail_saves(Some("storage offline")).await;
    assert_eq!(session.save().await, None);
    assert_eq!(session.draft(), &edited);
    assert!(session.notifications().last().unwrap().message.contains("storage offline"));

    backend.fail_saves(None).await;
    assert_eq!(session.save().await, Some(1));
    assert_eq!(session.draft().version, 1);
    assert_eq!(session.suite().unwrap().current_config_version, 1);
    assert_eq!(session.notifications().last().unwrap().message, "Saved configuration version 1");

    assert_eq!(session.save().await, Some(2));
    assert_eq!(session.suite().unwrap().latest_config_version, 2);
}

#[tokio::test]
async fn test_dismiss_notification() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend, Some(suite_id)).await;
    session.set_field_path("result");
    session.add_metric(Metric::Recall);

    let first = session.dismiss_notification(0).unwrap();
    assert!(first.message.contains("postprocessing"));
    assert_eq!(session.notifications().len(), 1);
    assert!(session.dismiss_notification(5).is_none());
}

#[tokio::test]
async fn test_test_all_steps_passes() {
    let (backend, suite_id) = backend_with_endpoint().await;
    let mut session = EditorSession::open(backend.clone(), Some(suite_id)).await;

    let outcomes = session.test_all_steps().await.expect("every step should pass");

    assert_eq!(outcomes.len(), 4);
    let last = session.notifications().last().unwrap();
    assert_eq!(last.level, NotificationLevel::Success);
    assert_eq!(last.message, "All steps passed");
    assert!(session.is_unlocked(StepName::Evaluation));
}

#[tokio::test]
async fn test_test_all_steps_stops_at_postprocessing() {
    let (backend, suite_id) = backend_with_endpoint().await;
    backend.script_step(StepName::Postprocessing, StepScript::Reject("field 'result' not found".to_string()));
    let mut session = EditorSession::open(backend.clone(), Some(suite_id)).await;

    assert!(session.test_all_steps().await.is_none());

    let last = session.notifications().last().unwrap();
    assert_eq!(last.level, NotificationLevel::Error);
    assert_eq!(last.message, "postprocessing test failed: field 'result' not found");
    let called: Vec<StepName> = backend.step_calls().await.into_iter().map(|(_, s)| s).collect();
    assert_eq!(called, vec![StepName::Preprocessing, StepName::Invocation, StepName::Postprocessing]);
    assert_eq!(session.status_of(StepName::Evaluation), TestStatus::Idle);
    assert!(!session.is_unlocked(StepName::Evaluation));
}

#[tokio::test]
async fn test_test_all_steps_needs_a_url() {
    let (backend, suite_id) = backend_with_suite();
    let mut session = EditorSession::open(backend.clone(), Some(suite_id)).await;
    assert!(session.draft().steps.invocation.input.url.is_empty());

    assert!(session.test_all_steps().await.is_none());

    let notes = session.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].message, "Invocation URL is required");
    assert!(backend.step_calls().await.is_empty());
    assert_eq!(session.status_of(StepName::Invocation), TestStatus::Idle);
}
