use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::AnswerValue;

/// Operators usable in a `show_if` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Lt,
    Lte,
    Gt,
    Gte,
    Includes,
    /// Operators from newer config versions land here and never match.
    #[serde(other)]
    Unknown,
}

/// Declarative rule tying a question's visibility to a prior answer.
///
/// `value` carries the operand for scalar operators; `values` carries the
/// candidate list for `includes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub source_question_id: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

/// Evaluates a condition against the answer it sources.
///
/// A missing answer, or one whose value is null, satisfies no operator.
/// Malformed operands (non-numeric comparison sides, absent `values`) resolve
/// to "not satisfied" rather than an error.
pub fn evaluate(condition: &Condition, answer: Option<&AnswerValue>) -> bool {
    let answer = match answer {
        Some(answer) if !answer.value.is_null() => &answer.value,
        _ => return false,
    };

    match condition.operator {
        ConditionOperator::Equals => condition
            .value
            .as_ref()
            .is_some_and(|value| values_equal(answer, value)),
        ConditionOperator::NotEquals => condition
            .value
            .as_ref()
            .is_none_or(|value| !values_equal(answer, value)),
        ConditionOperator::Lt => compare(answer, condition.value.as_ref(), |a, b| a < b),
        ConditionOperator::Lte => compare(answer, condition.value.as_ref(), |a, b| a <= b),
        ConditionOperator::Gt => compare(answer, condition.value.as_ref(), |a, b| a > b),
        ConditionOperator::Gte => compare(answer, condition.value.as_ref(), |a, b| a >= b),
        ConditionOperator::Includes => condition
            .values
            .as_ref()
            .is_some_and(|values| values.contains(answer)),
        ConditionOperator::Unknown => false,
    }
}

/// Numbers compare by value, so an integer-valued condition still matches a
/// float-serialized answer; everything else compares strictly.
fn values_equal(answer: &Value, expected: &Value) -> bool {
    match (answer.as_f64(), expected.as_f64()) {
        (Some(answer), Some(expected)) => answer == expected,
        _ => answer == expected,
    }
}

fn compare<F>(answer: &Value, threshold: Option<&Value>, predicate: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (answer.as_f64(), threshold.and_then(Value::as_f64)) {
        (Some(answer), Some(threshold)) => predicate(answer, threshold),
        _ => false,
    }
}
