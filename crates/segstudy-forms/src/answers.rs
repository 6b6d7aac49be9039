use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Answers addressed by composite key (or by bare question id within a step).
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// A single recorded answer. The timestamp is rewritten on every write, even
/// when only the comment changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerValue {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: String,
}

impl AnswerValue {
    /// Records a value with a fresh timestamp.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            comment: None,
            timestamp: now_rfc3339(),
        }
    }

    /// Records a value plus the participant's free-text comment.
    pub fn with_comment(value: Value, comment: impl Into<String>) -> Self {
        Self {
            value,
            comment: Some(comment.into()),
            timestamp: now_rfc3339(),
        }
    }
}

/// Composite storage key for an answer: `step.itemId`, or `step.caseId.itemId`
/// when the answer belongs to a specific case.
pub fn answer_key(step: &str, case_id: Option<&str>, item_id: &str) -> String {
    match case_id {
        Some(case_id) => format!("{step}.{case_id}.{item_id}"),
        None => format!("{step}.{item_id}"),
    }
}

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("rfc3339 formatting")
}
