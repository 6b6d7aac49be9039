use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use segstudy_forms::{
    AnswerMap, AnswerValue, QuestionItem, answer_key, clears_for_change, generate_completion_code,
    now_rfc3339,
};

use crate::backend::{StorageBackend, StorageSlot};
use crate::consent::ConsentRecord;
use crate::error::StoreError;
use crate::queue::{QueuedAction, QueuedPayload};
use crate::remote::{AnswerRef, AnswerRow, ConsentRow, RemoteSync, SubmissionRow};
use crate::session::{COMPLETED_STEP, ParticipantSession, SessionPatch};

/// Local-first persistence for one participant.
///
/// Every mutation lands in the injected storage backend before any remote
/// attempt. Remote failures on upserts, consent, and the final submission are
/// parked in the offline queue; the caller still sees success because local
/// durability satisfies the contract. A `None` remote means the backend is
/// unconfigured and every remote call is skipped.
pub struct DataLayer<B: StorageBackend> {
    backend: B,
    remote: Option<Arc<dyn RemoteSync>>,
}

impl<B: StorageBackend> DataLayer<B> {
    pub fn new(backend: B, remote: Option<Arc<dyn RemoteSync>>) -> Self {
        Self { backend, remote }
    }

    /// Data layer without a remote backend; all writes stay on the device.
    pub fn local_only(backend: B) -> Self {
        Self::new(backend, None)
    }

    pub fn is_remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: StorageSlot) -> Option<T> {
        let payload = self.backend.load(slot)?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(slot = slot.key(), %error, "discarding corrupt slot payload");
                None
            }
        }
    }

    fn write_slot<T: Serialize>(&self, slot: StorageSlot, value: &T) -> Result<(), StoreError> {
        let payload = serde_json::to_string(value)?;
        self.backend.store(slot, &payload);
        Ok(())
    }

    // --- session ---

    /// Returns the persisted session, creating and persisting a fresh one when
    /// absent or unparseable.
    pub fn get_or_create_session(&self) -> ParticipantSession {
        if let Some(session) = self.read_slot::<ParticipantSession>(StorageSlot::Session) {
            return session;
        }
        let session = ParticipantSession::fresh();
        if let Err(e) = self.write_slot(StorageSlot::Session, &session) {
            error!(error = %e, "failed to persist fresh session");
        }
        session
    }

    /// Shallow-merges the patch into the persisted session and rewrites it.
    pub fn update_session(&self, patch: &SessionPatch) -> ParticipantSession {
        let mut session = self.get_or_create_session();
        session.apply(patch);
        if let Err(e) = self.write_slot(StorageSlot::Session, &session) {
            error!(error = %e, "failed to persist session update");
        }
        session
    }

    /// Clears every storage slot. Explicit reset path only.
    pub fn clear_all(&self) {
        for slot in StorageSlot::ALL {
            self.backend.remove(slot);
        }
    }

    // --- answers ---

    /// The full persisted answer map; corrupt or missing content degrades to
    /// empty.
    pub fn stored_answers(&self) -> AnswerMap {
        self.read_slot(StorageSlot::Answers).unwrap_or_default()
    }

    /// Answers for one step (and case), re-keyed by bare question id. This is
    /// the view the visibility resolver evaluates against.
    pub fn step_answers(&self, step: &str, case_id: Option<&str>) -> AnswerMap {
        let prefix = match case_id {
            Some(case_id) => format!("{step}.{case_id}."),
            None => format!("{step}."),
        };
        self.stored_answers()
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .filter(|item_id| !item_id.contains('.'))
                    .map(|item_id| (item_id.to_string(), value))
            })
            .collect()
    }

    /// Writes an answer into the local map only. Remote sync is the caller's
    /// concern (the autosave path defers it).
    pub fn write_local_answer(
        &self,
        step: &str,
        case_id: Option<&str>,
        item_id: &str,
        value: &AnswerValue,
    ) -> Result<(), StoreError> {
        let mut answers = self.stored_answers();
        answers.insert(answer_key(step, case_id, item_id), value.clone());
        self.write_slot(StorageSlot::Answers, &answers)
    }

    /// Pushes an answer to the remote store; a failure enqueues the full
    /// payload for replay.
    pub async fn sync_answer_remote(
        &self,
        step: &str,
        case_id: Option<&str>,
        item_id: &str,
        value: &AnswerValue,
    ) -> Result<(), StoreError> {
        let Some(remote) = self.remote.as_ref() else {
            return Ok(());
        };
        let session = self.get_or_create_session();
        let row = answer_row(&session.session_id, step, case_id, item_id, value);
        if let Err(e) = remote.upsert_answer(&row).await {
            warn!(error = %e, step, item_id, "remote answer upsert failed, queueing for retry");
            self.enqueue(QueuedPayload::UpsertAnswer {
                session_id: session.session_id,
                step: step.to_string(),
                case_id: case_id.map(str::to_string),
                item_id: item_id.to_string(),
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    /// Local write plus immediate remote attempt. Succeeds once the local
    /// write lands, regardless of the remote outcome.
    pub async fn upsert_answer(
        &self,
        step: &str,
        case_id: Option<&str>,
        item_id: &str,
        value: AnswerValue,
    ) -> Result<(), StoreError> {
        self.write_local_answer(step, case_id, item_id, &value)?;
        self.sync_answer_remote(step, case_id, item_id, &value).await
    }

    /// Removes an answer locally with a best-effort remote delete. Failed
    /// deletes are logged, never queued.
    pub async fn delete_answer(
        &self,
        step: &str,
        case_id: Option<&str>,
        item_id: &str,
    ) -> Result<(), StoreError> {
        let mut answers = self.stored_answers();
        answers.remove(&answer_key(step, case_id, item_id));
        self.write_slot(StorageSlot::Answers, &answers)?;

        if let Some(remote) = self.remote.as_ref() {
            let session = self.get_or_create_session();
            let key = AnswerRef {
                participant_id: session.session_id,
                step: step.to_string(),
                case_id: case_id.map(str::to_string),
                item_id: item_id.to_string(),
            };
            if let Err(e) = remote.delete_answer(&key).await {
                error!(error = %e, step, item_id, "remote answer delete failed");
            }
        }
        Ok(())
    }

    /// Cascade-clear after `changed_id` takes `new_value`: direct dependents
    /// that became hidden are deleted locally and (best-effort) remotely.
    /// Returns the cleared question ids.
    pub async fn clear_dependents(
        &self,
        step: &str,
        case_id: Option<&str>,
        questions: &[QuestionItem],
        changed_id: &str,
        new_value: &AnswerValue,
    ) -> Result<Vec<String>, StoreError> {
        let answers = self.step_answers(step, case_id);
        let cleared = clears_for_change(questions, &answers, changed_id, new_value);
        for item_id in &cleared {
            self.delete_answer(step, case_id, item_id).await?;
        }
        Ok(cleared)
    }

    // --- consent ---

    /// Persists consent locally, marks the session, then attempts the remote
    /// insert (queued on failure).
    pub async fn save_consent(&self, record: ConsentRecord) -> Result<(), StoreError> {
        self.write_slot(StorageSlot::Consent, &record)?;
        self.update_session(&SessionPatch {
            consent_given: Some(true),
            ..Default::default()
        });

        let Some(remote) = self.remote.as_ref() else {
            return Ok(());
        };
        let session = self.get_or_create_session();
        if let Err(e) = remote.insert_consent(&consent_row(&session.session_id, &record)).await {
            warn!(error = %e, "remote consent insert failed, queueing for retry");
            self.enqueue(QueuedPayload::SaveConsent {
                session_id: session.session_id,
                record,
            })?;
        }
        Ok(())
    }

    pub fn stored_consent(&self) -> Option<ConsentRecord> {
        self.read_slot(StorageSlot::Consent)
    }

    // --- final submission ---

    /// Marks the session completed and submits the completion record. The
    /// code is generated before the remote attempt and always returned, even
    /// when the submission had to be queued.
    pub async fn submit_final(&self) -> Result<String, StoreError> {
        let session = self.get_or_create_session();
        let completion_code = generate_completion_code();
        self.update_session(&SessionPatch {
            current_step: Some(COMPLETED_STEP),
            ..Default::default()
        });

        if let Some(remote) = self.remote.as_ref() {
            let row = SubmissionRow {
                participant_id: session.session_id.clone(),
                submitted_at: now_rfc3339(),
                completion_code: completion_code.clone(),
            };
            if let Err(e) = remote.insert_submission(&row).await {
                warn!(error = %e, "final submission failed, queueing for retry");
                self.enqueue(QueuedPayload::SubmitFinal {
                    session_id: session.session_id,
                    completion_code: completion_code.clone(),
                })?;
            }
        }
        Ok(completion_code)
    }

    // --- offline queue ---

    /// Pending remote mutations, oldest first.
    pub fn queued_actions(&self) -> Vec<QueuedAction> {
        self.read_slot(StorageSlot::Queue).unwrap_or_default()
    }

    fn enqueue(&self, payload: QueuedPayload) -> Result<(), StoreError> {
        let mut queue = self.queued_actions();
        queue.push(QueuedAction::new(payload));
        self.write_slot(StorageSlot::Queue, &queue)
    }

    fn remove_queued(&self, id: &str) -> Result<(), StoreError> {
        let queue: Vec<QueuedAction> = self
            .queued_actions()
            .into_iter()
            .filter(|entry| entry.id != id)
            .collect();
        self.write_slot(StorageSlot::Queue, &queue)
    }

    /// Replays the queue once, in insertion order. Success removes the entry;
    /// failure leaves it untouched for a later pass and never blocks the
    /// entries behind it. A no-op when the remote backend is unconfigured.
    pub async fn process_queue(&self) -> Result<(), StoreError> {
        let Some(remote) = self.remote.as_ref() else {
            return Ok(());
        };

        for entry in self.queued_actions() {
            let outcome = match &entry.payload {
                QueuedPayload::UpsertAnswer {
                    session_id,
                    step,
                    case_id,
                    item_id,
                    value,
                } => {
                    remote
                        .upsert_answer(&answer_row(
                            session_id,
                            step,
                            case_id.as_deref(),
                            item_id,
                            value,
                        ))
                        .await
                }
                QueuedPayload::SaveConsent { session_id, record } => {
                    remote.insert_consent(&consent_row(session_id, record)).await
                }
                QueuedPayload::SubmitFinal {
                    session_id,
                    completion_code,
                } => {
                    remote
                        .insert_submission(&SubmissionRow {
                            participant_id: session_id.clone(),
                            submitted_at: now_rfc3339(),
                            completion_code: completion_code.clone(),
                        })
                        .await
                }
            };

            match outcome {
                Ok(()) => {
                    self.remove_queued(&entry.id)?;
                    debug!(id = %entry.id, "replayed queued action");
                }
                Err(e) => warn!(id = %entry.id, error = %e, "queued action still failing"),
            }
        }
        Ok(())
    }
}

fn answer_row(
    participant_id: &str,
    step: &str,
    case_id: Option<&str>,
    item_id: &str,
    value: &AnswerValue,
) -> AnswerRow {
    AnswerRow {
        participant_id: participant_id.to_string(),
        step: step.to_string(),
        case_id: case_id.map(str::to_string),
        item_id: item_id.to_string(),
        value_json: value.value.clone(),
        comment: value.comment.clone(),
        updated_at: value.timestamp.clone(),
    }
}

fn consent_row(participant_id: &str, record: &ConsentRecord) -> ConsentRow {
    ConsentRow {
        participant_id: participant_id.to_string(),
        consented_at: record.consented_at.clone(),
        items_json: serde_json::to_value(&record.items).unwrap_or(Value::Null),
        name: record.name.clone(),
        email: record.email.clone(),
        center: record.center.clone(),
    }
}
