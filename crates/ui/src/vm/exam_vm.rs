use exam_core::fragment::Fragment;
use exam_core::model::{Direction, ExamId, OptionStatus, QuestionStatus, SessionProgress, option_number};
use services::{ExamSession, ExamSessionError, ExamSourceError, KeyOutcome, PendingAdvance};

use crate::views::ViewError;
use crate::vm::fragment_history::FragmentHistory;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamIntent {
    ShowPage(usize),
    Choose(usize),
    Reset,
    SwitchExam(ExamId),
    Back,
    Forward,
    Key(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamPickerItemVm {
    pub id: ExamId,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageVm {
    pub index: usize,
    pub number: usize,
    pub class: String,
    pub link: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub index: usize,
    pub number: u32,
    pub label: String,
    pub class: &'static str,
}

/// Render snapshot of the exam screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamPageVm {
    pub exams: Vec<ExamPickerItemVm>,
    pub exam_id: ExamId,
    pub lang: String,
    pub dir: Direction,
    pub ready: bool,
    pub progress: SessionProgress,
    pub current_index: usize,
    pub number: usize,
    pub prompt: Option<String>,
    pub options: Vec<OptionVm>,
    pub pages: Vec<PageVm>,
    pub link: String,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

pub struct ExamVm {
    session: ExamSession,
    history: FragmentHistory,
}

impl ExamVm {
    #[must_use]
    pub fn new(session: ExamSession) -> Self {
        Self {
            session,
            history: FragmentHistory::default(),
        }
    }

    #[must_use]
    pub fn has_catalog(&self) -> bool {
        self.session.catalog().is_some()
    }

    #[must_use]
    pub fn lang(&self) -> &str {
        self.session.lang().unwrap_or("en")
    }

    /// Fetch the catalog and open `fragment`.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Offline` when the source is unreachable,
    /// `ViewError::UnknownExam` when the fragment names no cataloged exam, and
    /// `ViewError::Unknown` for other failures.
    pub async fn open(&mut self, fragment: Fragment) -> Result<(), ViewError> {
        let result = self.session.load_catalog(fragment).await;
        self.record_visit();
        result.map(|_| ()).map_err(map_session_error)
    }

    /// Apply a user intent. A correct choice comes back with the advance to
    /// schedule.
    ///
    /// # Errors
    ///
    /// Returns the `ViewError` matching the underlying session failure.
    pub async fn apply(&mut self, intent: ExamIntent) -> Result<Option<PendingAdvance>, ViewError> {
        match intent {
            ExamIntent::ShowPage(index) => {
                self.show_page(index);
                Ok(None)
            }
            ExamIntent::Choose(option_index) => self
                .session
                .select_option(option_index)
                .await
                .map(|selection| selection.advance)
                .map_err(map_session_error),
            ExamIntent::Reset => {
                self.session.reset_exam().await.map_err(map_session_error)?;
                Ok(None)
            }
            ExamIntent::SwitchExam(exam_id) => {
                let result = self.session.switch_exam(exam_id).await;
                self.record_visit();
                result.map(|_| None).map_err(map_session_error)
            }
            ExamIntent::Back => {
                let target = self.history.back().cloned();
                self.revisit(target).await
            }
            ExamIntent::Forward => {
                let target = self.history.forward().cloned();
                self.revisit(target).await
            }
            ExamIntent::Key(key) => match self.session.handle_key(&key).await {
                Ok(KeyOutcome::Navigated(navigation)) => {
                    self.history.push(navigation.fragment);
                    Ok(None)
                }
                Ok(KeyOutcome::Selected(selection)) => Ok(selection.advance),
                Ok(KeyOutcome::Ignored) => Ok(None),
                Err(err) => Err(map_session_error(err)),
            },
        }
    }

    /// Returns `true` if the advance was still current and moved the session.
    pub fn apply_advance(&mut self, pending: &PendingAdvance) -> bool {
        match self.session.apply_auto_advance(pending) {
            Some(navigation) => {
                self.history.push(navigation.fragment);
                true
            }
            None => false,
        }
    }

    fn show_page(&mut self, index: usize) {
        let navigation = self.session.navigate_to(i64::try_from(index).ok());
        self.history.push(navigation.fragment);
    }

    async fn revisit(&mut self, target: Option<Fragment>) -> Result<Option<PendingAdvance>, ViewError> {
        let Some(fragment) = target else {
            return Ok(None);
        };
        self.session
            .sync_fragment(&fragment.to_string())
            .await
            .map(|_| None)
            .map_err(map_session_error)
    }

    fn record_visit(&mut self) {
        if self.has_catalog() {
            self.history.push(self.session.fragment().clone());
        }
    }

    #[must_use]
    pub fn page(&self) -> ExamPageVm {
        let session = self.session.session();
        let exam_id = session.exam_id().clone();
        let exams = self
            .session
            .catalog()
            .map(|catalog| {
                catalog
                    .iter()
                    .map(|(id, _)| ExamPickerItemVm {
                        id: id.clone(),
                        selected: *id == exam_id,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let pages = (0..session.len())
            .map(|index| PageVm {
                index,
                number: index + 1,
                class: page_class(session.question_status(index), session.is_current_page(index)),
                link: session.page_link(index).to_string(),
            })
            .collect();

        let current = session.current_question();
        let options = current
            .map(|question| {
                question
                    .options()
                    .iter()
                    .enumerate()
                    .map(|(index, label)| OptionVm {
                        index,
                        number: option_number(index),
                        label: label.clone(),
                        class: option_class(session.option_status(index)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        ExamPageVm {
            exams,
            exam_id,
            lang: self.lang().to_string(),
            dir: self.session.direction(),
            ready: self.session.is_ready(),
            progress: session.progress(),
            current_index: session.current_index(),
            number: session.display_number(),
            prompt: current.map(|question| question.prompt().to_string()),
            options,
            pages,
            link: self.session.fragment().to_string(),
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
        }
    }
}

#[must_use]
pub fn page_class(status: QuestionStatus, current: bool) -> String {
    let status = match status {
        QuestionStatus::Unanswered => "exam-page--unanswered",
        QuestionStatus::AnsweredCorrectly => "exam-page--correct",
        QuestionStatus::AnsweredIncorrectly => "exam-page--incorrect",
    };
    if current {
        format!("exam-page {status} exam-page--current")
    } else {
        format!("exam-page {status}")
    }
}

#[must_use]
pub fn option_class(status: OptionStatus) -> &'static str {
    match status {
        OptionStatus::Neutral => "exam-option",
        OptionStatus::SelectedCorrect => "exam-option exam-option--correct",
        OptionStatus::SelectedIncorrect => "exam-option exam-option--incorrect",
    }
}

fn map_session_error(err: ExamSessionError) -> ViewError {
    tracing::warn!("exam view error: {err}");
    match err {
        ExamSessionError::UnknownExam(_) => ViewError::UnknownExam,
        ExamSessionError::Question(_) | ExamSessionError::Source(ExamSourceError::Decode(_)) => {
            ViewError::InvalidExam
        }
        ExamSessionError::Source(
            ExamSourceError::Offline | ExamSourceError::Http(_) | ExamSourceError::HttpStatus(_),
        ) => ViewError::Offline,
        _ => ViewError::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use exam_core::model::{ExamCatalog, QuestionDraft, QuestionError};
    use exam_core::time::fixed_clock;
    use services::{AppServices, StaticExamSource};

    use super::*;

    fn source() -> StaticExamSource {
        let catalog = ExamCatalog::from_json(
            r#"{ "math101": { "lang": "en", "dir": "ltr" }, "torah": { "lang": "he", "dir": "rtl" } }"#,
        )
        .unwrap();
        let drafts = QuestionDraft::list_from_json(
            r#"[
                { "question": "1 + 1?", "options": ["1", "2", "3"], "answer": 2 },
                { "question": "2 + 2?", "options": ["4", "5"], "answer": 1 },
                { "question": "3 + 3?", "options": ["5", "6", "7"], "answer": 2 }
            ]"#,
        )
        .unwrap();
        StaticExamSource::new(catalog)
            .with_questions(ExamId::new("math101"), drafts.clone())
            .with_questions(ExamId::new("torah"), drafts)
    }

    fn exam_vm(source: StaticExamSource) -> ExamVm {
        let services = AppServices::in_memory(fixed_clock(), Arc::new(source));
        ExamVm::new(services.exam_session())
    }

    #[test]
    fn page_classes_follow_status() {
        assert_eq!(
            page_class(QuestionStatus::Unanswered, true),
            "exam-page exam-page--unanswered exam-page--current"
        );
        assert_eq!(
            page_class(QuestionStatus::AnsweredIncorrectly, false),
            "exam-page exam-page--incorrect"
        );
        assert_eq!(option_class(OptionStatus::SelectedCorrect), "exam-option exam-option--correct");
    }

    #[test]
    fn session_errors_map_to_view_errors() {
        assert_eq!(
            map_session_error(ExamSessionError::UnknownExam(ExamId::new("x"))),
            ViewError::UnknownExam
        );
        assert_eq!(
            map_session_error(ExamSessionError::Source(ExamSourceError::Offline)),
            ViewError::Offline
        );
        assert_eq!(map_session_error(ExamSessionError::NoQuestions), ViewError::Unknown);
        assert_eq!(
            map_session_error(ExamSessionError::Question(QuestionError::AnswerOutOfRange {
                position: 0,
                answer: 4,
                options: 2,
            })),
            ViewError::InvalidExam
        );
    }

    #[tokio::test]
    async fn snapshot_reflects_current_question() {
        let mut vm = exam_vm(source());
        vm.open(Fragment::parse("#math101#2")).await.unwrap();

        let page = vm.page();
        assert!(page.ready);
        assert_eq!(page.number, 2);
        assert_eq!(page.prompt.as_deref(), Some("2 + 2?"));
        assert_eq!(page.options.len(), 2);
        assert_eq!(page.pages.len(), 3);
        assert_eq!(page.pages[2].link, "#math101#3");
        assert!(page.pages[1].class.contains("exam-page--current"));
        assert_eq!(page.link, "#math101#2");
        assert_eq!(page.exams.iter().filter(|item| item.selected).count(), 1);
    }

    #[tokio::test]
    async fn choose_then_advance_marks_progress() {
        let mut vm = exam_vm(source());
        vm.open(Fragment::parse("#math101#1")).await.unwrap();

        let advance = vm.apply(ExamIntent::Choose(1)).await.unwrap();
        let pending = advance.expect("correct choice advances");
        assert!(vm.apply_advance(&pending));
        assert!(!vm.apply_advance(&pending));

        let page = vm.page();
        assert_eq!(page.current_index, 1);
        assert_eq!(page.progress.correct, 1);
        assert!(page.pages[0].class.contains("exam-page--correct"));
        assert!(page.can_go_back);
    }

    #[tokio::test]
    async fn back_and_forward_rederive_the_session() {
        let mut vm = exam_vm(source());
        vm.open(Fragment::parse("#math101#1")).await.unwrap();
        vm.apply(ExamIntent::ShowPage(2)).await.unwrap();
        vm.apply(ExamIntent::SwitchExam(ExamId::new("torah"))).await.unwrap();
        assert_eq!(vm.page().dir, Direction::Rtl);

        vm.apply(ExamIntent::Back).await.unwrap();
        let page = vm.page();
        assert_eq!(page.exam_id, ExamId::new("math101"));
        assert_eq!(page.current_index, 2);
        assert!(page.can_go_forward);

        vm.apply(ExamIntent::Forward).await.unwrap();
        assert_eq!(vm.page().exam_id, ExamId::new("torah"));
        assert!(!vm.page().can_go_forward);
    }

    #[tokio::test]
    async fn rtl_keys_move_backwards_on_arrow_right() {
        let mut vm = exam_vm(source());
        vm.open(Fragment::parse("#torah#3")).await.unwrap();

        vm.apply(ExamIntent::Key("ArrowRight".into())).await.unwrap();
        assert_eq!(vm.page().current_index, 1);
    }

    #[tokio::test]
    async fn unknown_exam_keeps_picker() {
        let mut vm = exam_vm(source());
        let err = vm.open(Fragment::parse("#nope#1")).await.unwrap_err();
        assert_eq!(err, ViewError::UnknownExam);
        assert!(vm.has_catalog());

        let page = vm.page();
        assert!(!page.ready);
        assert_eq!(page.exams.len(), 2);
        assert!(page.pages.is_empty());
    }

    #[tokio::test]
    async fn invalid_questions_keep_picker_and_explain() {
        let catalog = ExamCatalog::from_json(r#"{ "broken": {}, "math101": {} }"#).unwrap();
        let drafts =
            QuestionDraft::list_from_json(r#"[{ "options": ["a", "b"], "answer": 4 }]"#).unwrap();
        let source = StaticExamSource::new(catalog).with_questions(ExamId::new("broken"), drafts);
        let mut vm = exam_vm(source);

        assert_eq!(
            vm.open(Fragment::parse("#broken#1")).await,
            Err(ViewError::InvalidExam)
        );
        assert!(vm.has_catalog());
        assert!(!vm.page().ready);
    }

    #[tokio::test]
    async fn offline_source_has_no_catalog() {
        let source = source();
        source.set_offline(true);
        let mut vm = exam_vm(source);
        assert_eq!(vm.open(Fragment::parse("#math101#1")).await, Err(ViewError::Offline));
        assert!(!vm.has_catalog());
    }
}
