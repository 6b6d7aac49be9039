#![allow(missing_docs)]

pub mod answers;
pub mod completion;
pub mod condition;
pub mod config;
pub mod question;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerMap, AnswerValue, answer_key, now_rfc3339};
pub use completion::{CODE_ALPHABET, CODE_LEN, generate_completion_code};
pub use condition::{Condition, ConditionOperator, evaluate};
pub use config::{CaseConfig, QuestionnaireConfig, StepConfig, TuringCase};
pub use question::{ChoiceOption, LikertConfig, QuestionItem, QuestionType, SliderConfig};
pub use validate::{StepValidation, validate_step};
pub use visibility::{clears_for_change, hidden_question_ids, is_visible, visible_subset};
