use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use segstudy_forms::{AnswerValue, Condition, ConditionOperator, QuestionItem, QuestionType};
use segstudy_store::{
    AnswerRef, AnswerRow, ConsentItem, ConsentRecord, ConsentRow, DataLayer, MemoryBackend,
    QueuedPayload, RemoteError, RemoteSync, StorageBackend, StorageSlot, SubmissionRow,
};

/// Remote double that records calls and fails on demand.
#[derive(Default)]
struct MockRemote {
    fail: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockRemote {
    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn attempt(&self, call: String) -> Result<(), RemoteError> {
        self.calls.lock().expect("calls lock").push(call);
        if self.fail.load(Ordering::SeqCst) {
            Err(RemoteError::Status(503))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteSync for MockRemote {
    async fn insert_consent(&self, row: &ConsentRow) -> Result<(), RemoteError> {
        self.attempt(format!("consent:{}", row.name))
    }

    async fn upsert_answer(&self, row: &AnswerRow) -> Result<(), RemoteError> {
        self.attempt(format!("upsert:{}", row.item_id))
    }

    async fn delete_answer(&self, key: &AnswerRef) -> Result<(), RemoteError> {
        self.attempt(format!("delete:{}", key.item_id))
    }

    async fn insert_submission(&self, row: &SubmissionRow) -> Result<(), RemoteError> {
        self.attempt(format!("submit:{}", row.completion_code))
    }
}

fn layer_with_remote() -> (DataLayer<MemoryBackend>, Arc<MockRemote>) {
    let remote = Arc::new(MockRemote::default());
    let layer = DataLayer::new(MemoryBackend::new(), Some(remote.clone()));
    (layer, remote)
}

fn consent_record() -> ConsentRecord {
    ConsentRecord {
        items: vec![ConsentItem {
            id: "data_use".into(),
            label: "I agree to the use of my answers".into(),
            checked: true,
        }],
        name: "A. Participant".into(),
        email: None,
        center: "center-3".into(),
        consented_at: "2026-08-01T10:00:00Z".into(),
    }
}

#[tokio::test]
async fn upsert_then_read_back_by_composite_key() {
    let layer = DataLayer::local_only(MemoryBackend::new());
    let value = AnswerValue::new(json!("resident"));

    layer
        .upsert_answer("profile", None, "role", value.clone())
        .await
        .expect("upsert succeeds");

    let answers = layer.stored_answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers.get("profile.role"), Some(&value));
}

#[tokio::test]
async fn case_answers_use_three_part_keys() {
    let layer = DataLayer::local_only(MemoryBackend::new());
    layer
        .upsert_answer("segmentation", Some("case_02"), "boundary", AnswerValue::new(json!(4)))
        .await
        .expect("upsert succeeds");

    assert!(layer.stored_answers().contains_key("segmentation.case_02.boundary"));
}

#[tokio::test]
async fn remote_failure_enqueues_and_still_succeeds() {
    let (layer, remote) = layer_with_remote();
    remote.set_failing(true);

    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("local durability satisfies the caller");

    let queue = layer.queued_actions();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].retries, 0);
    assert!(matches!(
        &queue[0].payload,
        QueuedPayload::UpsertAnswer { item_id, .. } if item_id == "role"
    ));
}

#[tokio::test]
async fn successful_replay_drains_the_queue() {
    let (layer, remote) = layer_with_remote();
    remote.set_failing(true);
    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("upsert succeeds");
    assert_eq!(layer.queued_actions().len(), 1);

    remote.set_failing(false);
    layer.process_queue().await.expect("replay succeeds");
    assert!(layer.queued_actions().is_empty());
}

#[tokio::test]
async fn failed_replay_leaves_entries_untouched() {
    let (layer, remote) = layer_with_remote();
    remote.set_failing(true);
    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("upsert succeeds");

    let before = layer.queued_actions();
    layer.process_queue().await.expect("replay itself does not error");
    let after = layer.queued_actions();

    // Same entry, same fields; retries stays at its enqueued value.
    assert_eq!(before, after);
}

#[tokio::test]
async fn one_failing_entry_does_not_block_later_ones() {
    let (layer, remote) = layer_with_remote();
    remote.set_failing(true);
    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("upsert succeeds");
    layer.save_consent(consent_record()).await.expect("consent succeeds");
    assert_eq!(layer.queued_actions().len(), 2);

    // Replay while still failing: both entries are attempted independently.
    layer.process_queue().await.expect("replay runs through");
    let attempts = remote
        .calls()
        .iter()
        .filter(|call| call.starts_with("consent") || call.starts_with("upsert"))
        .count();
    assert!(attempts >= 4, "both queued entries must be retried");
    assert_eq!(layer.queued_actions().len(), 2);
}

#[tokio::test]
async fn unconfigured_remote_skips_all_remote_calls() {
    let layer = DataLayer::local_only(MemoryBackend::new());
    assert!(!layer.is_remote_configured());

    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("upsert succeeds");
    layer.save_consent(consent_record()).await.expect("consent succeeds");
    layer.process_queue().await.expect("replay is a no-op");

    assert!(layer.queued_actions().is_empty(), "nothing to queue without a remote");
}

#[tokio::test]
async fn failed_delete_is_logged_not_queued() {
    let (layer, remote) = layer_with_remote();
    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("upsert succeeds");

    remote.set_failing(true);
    layer
        .delete_answer("profile", None, "role")
        .await
        .expect("delete succeeds locally");

    assert!(layer.stored_answers().is_empty());
    assert!(layer.queued_actions().is_empty(), "deletes are not retried");
}

#[tokio::test]
async fn save_consent_marks_session_and_persists_record() {
    let (layer, _remote) = layer_with_remote();
    layer.save_consent(consent_record()).await.expect("consent succeeds");

    assert!(layer.get_or_create_session().consent_given);
    let stored = layer.stored_consent().expect("consent record persisted");
    assert_eq!(stored.center, "center-3");
}

#[tokio::test]
async fn submit_final_returns_code_even_when_remote_fails() {
    let (layer, remote) = layer_with_remote();
    remote.set_failing(true);

    let code = layer.submit_final().await.expect("submission succeeds locally");
    assert_eq!(code.len(), 8);
    assert!(layer.get_or_create_session().is_completed());

    let queue = layer.queued_actions();
    assert_eq!(queue.len(), 1);
    assert!(matches!(
        &queue[0].payload,
        QueuedPayload::SubmitFinal { completion_code, .. } if *completion_code == code
    ));
}

#[tokio::test]
async fn session_is_stable_across_reads() {
    let layer = DataLayer::local_only(MemoryBackend::new());
    let first = layer.get_or_create_session();
    let second = layer.get_or_create_session();
    assert_eq!(first, second);
    assert_eq!(first.current_step, 0);
    assert!(!first.consent_given);
}

#[tokio::test]
async fn fresh_session_ids_have_the_documented_shape() {
    let layer = DataLayer::local_only(MemoryBackend::new());
    let session = layer.get_or_create_session();

    // sess_<unix-millis>_<random-fragment>
    let parts: Vec<&str> = session.session_id.split('_').collect();
    assert_eq!(parts.len(), 3, "unexpected id {}", session.session_id);
    assert_eq!(parts[0], "sess");
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert!(!parts[2].is_empty());
}

#[tokio::test]
async fn corrupt_slots_degrade_to_defaults() {
    let backend = MemoryBackend::new();
    backend.store(StorageSlot::Answers, "{not json");
    backend.store(StorageSlot::Session, "also not json");
    let layer = DataLayer::local_only(backend);

    assert!(layer.stored_answers().is_empty());
    let session = layer.get_or_create_session();
    assert_eq!(session.current_step, 0);
}

#[tokio::test]
async fn clear_all_resets_every_slot() {
    let layer = DataLayer::local_only(MemoryBackend::new());
    layer
        .upsert_answer("profile", None, "role", AnswerValue::new(json!("resident")))
        .await
        .expect("upsert succeeds");
    let before = layer.get_or_create_session();

    layer.clear_all();

    assert!(layer.stored_answers().is_empty());
    assert_ne!(layer.get_or_create_session().session_id, before.session_id);
}

#[tokio::test]
async fn clear_dependents_removes_hidden_answers() {
    let (layer, remote) = layer_with_remote();
    let questions = vec![
        QuestionItem {
            id: "has_concerns".into(),
            kind: QuestionType::Toggle,
            label: "Any concerns?".into(),
            description: None,
            required: false,
            likert_config: None,
            choices: None,
            slider_config: None,
            show_if: None,
            allow_comment: false,
            comment_label: None,
            placeholder: None,
        },
        QuestionItem {
            id: "concern_detail".into(),
            kind: QuestionType::Text,
            label: "Describe them".into(),
            description: None,
            required: false,
            likert_config: None,
            choices: None,
            slider_config: None,
            show_if: Some(Condition {
                source_question_id: "has_concerns".into(),
                operator: ConditionOperator::Equals,
                value: Some(json!(true)),
                values: None,
            }),
            allow_comment: false,
            comment_label: None,
            placeholder: None,
        },
    ];

    layer
        .upsert_answer("feedback", None, "has_concerns", AnswerValue::new(json!(true)))
        .await
        .expect("upsert succeeds");
    layer
        .upsert_answer("feedback", None, "concern_detail", AnswerValue::new(json!("edges")))
        .await
        .expect("upsert succeeds");

    let cleared = layer
        .clear_dependents(
            "feedback",
            None,
            &questions,
            "has_concerns",
            &AnswerValue::new(json!(false)),
        )
        .await
        .expect("cascade clear succeeds");

    assert_eq!(cleared, vec!["concern_detail"]);
    assert!(!layer.stored_answers().contains_key("feedback.concern_detail"));
    assert!(remote.calls().contains(&"delete:concern_detail".to_string()));
}
