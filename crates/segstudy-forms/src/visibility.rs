use crate::answers::{AnswerMap, AnswerValue};
use crate::condition::evaluate;
use crate::question::QuestionItem;

/// Whether a question should be shown given the current answers.
///
/// `answers` is keyed by bare question id (the per-step view). A question
/// without a `show_if` condition is always visible.
pub fn is_visible(question: &QuestionItem, answers: &AnswerMap) -> bool {
    match &question.show_if {
        Some(condition) => evaluate(condition, answers.get(&condition.source_question_id)),
        None => true,
    }
}

/// Filters the question list down to the visible subset, preserving order.
pub fn visible_subset<'a>(questions: &'a [QuestionItem], answers: &AnswerMap) -> Vec<&'a QuestionItem> {
    questions
        .iter()
        .filter(|question| is_visible(question, answers))
        .collect()
}

/// Ids of every question hidden under the current answers. Steps use this to
/// prune stale answers before a save.
pub fn hidden_question_ids(questions: &[QuestionItem], answers: &AnswerMap) -> Vec<String> {
    questions
        .iter()
        .filter(|question| !is_visible(question, answers))
        .map(|question| question.id.clone())
        .collect()
}

/// Direct dependents of `changed_id` that become hidden once `new_value` is
/// applied. The new value is overlaid on a temporary copy; the real answer map
/// is untouched.
///
/// Single-level only: dependents of a cleared question are not re-checked in
/// the same pass.
pub fn clears_for_change(
    questions: &[QuestionItem],
    answers: &AnswerMap,
    changed_id: &str,
    new_value: &AnswerValue,
) -> Vec<String> {
    let mut overlay = answers.clone();
    overlay.insert(changed_id.to_string(), new_value.clone());

    questions
        .iter()
        .filter(|question| {
            question
                .show_if
                .as_ref()
                .is_some_and(|condition| condition.source_question_id == changed_id)
                && !is_visible(question, &overlay)
        })
        .map(|question| question.id.clone())
        .collect()
}
