use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::AnswerMap;
use crate::question::{QuestionItem, QuestionType};
use crate::visibility::is_visible;

/// Outcome of checking one step's answers against its question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepValidation {
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_of_range: Vec<String>,
}

/// Checks required coverage and scale bounds for a step.
///
/// Hidden questions are skipped entirely; a null value counts as unanswered.
/// Never panics and never errors: malformed answers simply show up in the
/// result lists.
pub fn validate_step(questions: &[QuestionItem], answers: &AnswerMap) -> StepValidation {
    let mut missing_required = Vec::new();
    let mut out_of_range = Vec::new();

    for question in questions {
        if !is_visible(question, answers) {
            continue;
        }

        match answers.get(&question.id) {
            None => {
                if question.required {
                    missing_required.push(question.id.clone());
                }
            }
            Some(answer) if answer.value.is_null() => {
                if question.required {
                    missing_required.push(question.id.clone());
                }
            }
            Some(answer) => {
                if !in_range(question, &answer.value) {
                    out_of_range.push(question.id.clone());
                }
            }
        }
    }

    StepValidation {
        complete: missing_required.is_empty() && out_of_range.is_empty(),
        missing_required,
        out_of_range,
    }
}

fn in_range(question: &QuestionItem, value: &Value) -> bool {
    match question.kind {
        QuestionType::Likert => match (&question.likert_config, value.as_i64()) {
            (Some(config), Some(value)) => value >= config.min && value <= config.max,
            _ => true,
        },
        QuestionType::Slider => match (&question.slider_config, value.as_f64()) {
            (Some(config), Some(value)) => value >= config.min && value <= config.max,
            _ => true,
        },
        _ => true,
    }
}
