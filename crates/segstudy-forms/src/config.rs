use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::question::{ChoiceOption, QuestionItem};

/// One segmentation case: a rated image set with its own question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseConfig {
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionItem>,
}

/// One A/B comparison case in the Turing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TuringCase {
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub question_text: String,
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub show_confidence_slider: bool,
    #[serde(default)]
    pub show_reasoning: bool,
}

/// Metadata for one step of the questionnaire flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepConfig {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Complete questionnaire definition: profile, per-case segmentation ratings,
/// Turing comparisons, and closing feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireConfig {
    pub version: String,
    pub profile_questions: Vec<QuestionItem>,
    pub segmentation_cases: Vec<CaseConfig>,
    pub turing_cases: Vec<TuringCase>,
    pub feedback_questions: Vec<QuestionItem>,
    pub steps: Vec<StepConfig>,
}
