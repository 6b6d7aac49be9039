use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use segstudy_forms::now_rfc3339;

/// Sentinel `current_step` marking a completed questionnaire.
pub const COMPLETED_STEP: i32 = -1;

/// Per-device participant session. Created once on first visit, mutated on
/// step transitions and consent, deleted only by an explicit reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSession {
    pub session_id: String,
    pub created_at: String,
    pub current_step: i32,
    pub current_case_index: usize,
    pub consent_given: bool,
}

impl ParticipantSession {
    /// Fresh session at step 0, consent not yet given.
    pub fn fresh() -> Self {
        Self {
            session_id: new_session_id(),
            created_at: now_rfc3339(),
            current_step: 0,
            current_case_index: 0,
            consent_given: false,
        }
    }

    /// Shallow-merges the patch; `None` fields are left untouched.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(current_step) = patch.current_step {
            self.current_step = current_step;
        }
        if let Some(current_case_index) = patch.current_case_index {
            self.current_case_index = current_case_index;
        }
        if let Some(consent_given) = patch.consent_given {
            self.consent_given = consent_given;
        }
    }

    pub fn is_completed(&self) -> bool {
        self.current_step == COMPLETED_STEP
    }
}

/// Partial session update.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub current_step: Option<i32>,
    pub current_case_index: Option<usize>,
    pub consent_given: Option<bool>,
}

/// Collision-resistant within one device's lifetime; no cross-device
/// uniqueness is promised.
fn new_session_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix = Uuid::new_v4().simple().to_string();
    format!("sess_{millis}_{}", &suffix[..9])
}
