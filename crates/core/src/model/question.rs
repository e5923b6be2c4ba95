use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {position} has no answer")]
    MissingAnswer { position: usize },

    #[error("question {position} answer {answer} exceeds {options} options")]
    AnswerOutOfRange {
        position: usize,
        answer: u32,
        options: usize,
    },

    #[error("question at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: usize },

    #[error("invalid question list: {0}")]
    Malformed(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// How a single option of the current question should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionStatus {
    Neutral,
    SelectedCorrect,
    SelectedIncorrect,
}

/// Answer state of a question, as shown in the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unanswered,
    AnsweredCorrectly,
    AnsweredIncorrectly,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A question as delivered by an exam source, before numbering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub answer: Option<u32>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionDraft {
    /// Parse a per-exam question list.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::Malformed` if the document is not an array of question objects.
    pub fn list_from_json(raw: &str) -> Result<Vec<Self>, QuestionError> {
        serde_json::from_str(raw).map_err(|err| QuestionError::Malformed(err.to_string()))
    }
}

/// Source keys that collide with the fields a `Question` writes itself.
const RESERVED_FIELDS: [&str; 3] = ["index", "i", "userChoice"];

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice item with its recorded user choice.
///
/// `answer` and `user_choice` are 1-based option numbers; a `user_choice` of 0
/// means unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(alias = "i")]
    index: usize,
    answer: u32,
    #[serde(default)]
    user_choice: u32,
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Question {
    /// Number freshly fetched drafts and reset their choices.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a draft lacks a usable answer.
    pub fn number_fetched(drafts: Vec<QuestionDraft>) -> Result<Vec<Self>, QuestionError> {
        drafts
            .into_iter()
            .enumerate()
            .map(|(position, draft)| {
                let answer = match draft.answer {
                    Some(answer) if answer > 0 => answer,
                    _ => return Err(QuestionError::MissingAnswer { position }),
                };
                check_answer_range(position, answer, draft.options.len())?;
                let mut extra = draft.extra;
                for field in RESERVED_FIELDS {
                    extra.remove(field);
                }
                Ok(Self {
                    index: position,
                    answer,
                    user_choice: 0,
                    question: draft.question,
                    options: draft.options,
                    extra,
                })
            })
            .collect()
    }

    /// Check a restored question list against the numbering invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` on the first question that breaks them.
    pub fn validate_saved(questions: &[Self]) -> Result<(), QuestionError> {
        for (position, question) in questions.iter().enumerate() {
            if question.index != position {
                return Err(QuestionError::IndexMismatch {
                    position,
                    index: question.index,
                });
            }
            if question.answer == 0 {
                return Err(QuestionError::MissingAnswer { position });
            }
            check_answer_range(position, question.answer, question.options.len())?;
        }
        Ok(())
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn answer(&self) -> u32 {
        self.answer
    }

    #[must_use]
    pub fn user_choice(&self) -> u32 {
        self.user_choice
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Source fields the viewer does not interpret.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.user_choice != 0
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_answered() && self.user_choice == self.answer
    }

    pub fn choose(&mut self, choice: u32) {
        self.user_choice = choice;
    }

    #[must_use]
    pub fn status(&self) -> QuestionStatus {
        if !self.is_answered() {
            QuestionStatus::Unanswered
        } else if self.user_choice == self.answer {
            QuestionStatus::AnsweredCorrectly
        } else {
            QuestionStatus::AnsweredIncorrectly
        }
    }

    /// Status of the option at a 0-based position.
    #[must_use]
    pub fn option_status(&self, option_index: usize) -> OptionStatus {
        let number = option_number(option_index);
        if self.user_choice != number {
            return OptionStatus::Neutral;
        }
        if self.answer == number {
            OptionStatus::SelectedCorrect
        } else {
            OptionStatus::SelectedIncorrect
        }
    }
}

/// Convert a 0-based option position into its 1-based option number.
#[must_use]
pub fn option_number(option_index: usize) -> u32 {
    u32::try_from(option_index).map_or(u32::MAX, |i| i.saturating_add(1))
}

fn check_answer_range(position: usize, answer: u32, options: usize) -> Result<(), QuestionError> {
    if options == 0 {
        return Ok(());
    }
    if usize::try_from(answer).map_or(true, |answer| answer > options) {
        return Err(QuestionError::AnswerOutOfRange {
            position,
            answer,
            options,
        });
    }
    Ok(())
}
