use serde::{Deserialize, Serialize};

/// One consent checkbox as presented to the participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentItem {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// Consent captured before the questionnaire starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub items: Vec<ConsentItem>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub center: String,
    pub consented_at: String,
}
