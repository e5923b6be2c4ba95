use crate::fragment::Fragment;
use crate::model::ids::ExamId;
use crate::model::question::{OptionStatus, Question, QuestionStatus, option_number};

/// Aggregate answer counts for the loaded exam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub incorrect: usize,
}

/// Result of recording a choice on the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub question_index: usize,
    pub choice: u32,
    pub correct: bool,
}

/// The in-memory exam being worked through.
///
/// `current_index` always addresses a question when `questions` is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    exam_id: ExamId,
    questions: Vec<Question>,
    current_index: usize,
}

impl Session {
    /// An exam selected but not yet resolved.
    #[must_use]
    pub fn pending(exam_id: ExamId) -> Self {
        Self {
            exam_id,
            questions: Vec::new(),
            current_index: 0,
        }
    }

    /// Replace the question list wholesale and move to the requested index.
    pub fn replace_questions(&mut self, questions: Vec<Question>, requested: Option<i64>) {
        self.questions = questions;
        self.current_index = self.clamp_index(requested);
    }

    /// Map a requested index onto a valid one. Anything missing or out of range is 0.
    #[must_use]
    pub fn clamp_index(&self, requested: Option<i64>) -> usize {
        requested
            .and_then(|value| usize::try_from(value).ok())
            .filter(|value| *value < self.questions.len())
            .unwrap_or(0)
    }

    /// Move to `requested`, clamped. Returns the index moved to.
    pub fn navigate_to(&mut self, requested: Option<i64>) -> usize {
        self.current_index = self.clamp_index(requested);
        self.current_index
    }

    /// Record the option at `option_index` (0-based) on the current question.
    ///
    /// Returns `None` when no question is loaded.
    pub fn record_choice(&mut self, option_index: usize) -> Option<ChoiceOutcome> {
        let question_index = self.current_index;
        let question = self.questions.get_mut(question_index)?;
        let choice = option_number(option_index);
        question.choose(choice);
        Some(ChoiceOutcome {
            question_index,
            choice,
            correct: question.answer() == choice,
        })
    }

    #[must_use]
    pub fn exam_id(&self) -> &ExamId {
        &self.exam_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// 1-based number of the current question.
    #[must_use]
    pub fn display_number(&self) -> usize {
        self.current_index + 1
    }

    #[must_use]
    pub fn option_status(&self, option_index: usize) -> OptionStatus {
        self.current_question()
            .map_or(OptionStatus::Neutral, |q| q.option_status(option_index))
    }

    #[must_use]
    pub fn question_status(&self, index: usize) -> QuestionStatus {
        self.questions
            .get(index)
            .map_or(QuestionStatus::Unanswered, Question::status)
    }

    #[must_use]
    pub fn is_current_page(&self, index: usize) -> bool {
        self.current_index == index
    }

    /// Fragment that deep-links to question `index` of this exam.
    #[must_use]
    pub fn page_link(&self, index: usize) -> Fragment {
        Fragment::for_page(self.exam_id.clone(), index)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let mut progress = SessionProgress {
            total: self.questions.len(),
            ..SessionProgress::default()
        };
        for question in &self.questions {
            match question.status() {
                QuestionStatus::Unanswered => {}
                QuestionStatus::AnsweredCorrectly => {
                    progress.answered += 1;
                    progress.correct += 1;
                }
                QuestionStatus::AnsweredIncorrectly => {
                    progress.answered += 1;
                    progress.incorrect += 1;
                }
            }
        }
        progress
    }
}
