use serde::{Deserialize, Serialize};
use uuid::Uuid;

use segstudy_forms::{AnswerValue, now_rfc3339};

use crate::consent::ConsentRecord;

/// A remote mutation awaiting successful delivery.
///
/// Created when a remote write fails, destroyed when a replay succeeds. The
/// `retries` counter is recorded at enqueue time and is not mutated by
/// replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: String,
    #[serde(flatten)]
    pub payload: QueuedPayload,
    pub timestamp: String,
    pub retries: u32,
}

/// Payload of a queued mutation, tagged by action name. Each variant carries
/// everything needed to re-submit independently of live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum QueuedPayload {
    UpsertAnswer {
        session_id: String,
        step: String,
        case_id: Option<String>,
        item_id: String,
        value: AnswerValue,
    },
    SaveConsent {
        session_id: String,
        record: ConsentRecord,
    },
    SubmitFinal {
        session_id: String,
        completion_code: String,
    },
}

impl QueuedAction {
    /// Wraps a payload with a fresh id, a now-timestamp, and zero retries.
    pub fn new(payload: QueuedPayload) -> Self {
        Self {
            id: format!("q_{}", Uuid::new_v4().simple()),
            payload,
            timestamp: now_rfc3339(),
            retries: 0,
        }
    }
}
