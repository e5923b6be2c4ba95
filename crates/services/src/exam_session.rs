use std::sync::Arc;
use std::time::Duration;

use exam_core::fragment::Fragment;
use exam_core::keyboard::KeyCommand;
use exam_core::model::{
    ChoiceOutcome, Direction, ExamCatalog, ExamId, ExamMeta, Question, Session,
};
use storage::repository::{ProgressRecord, ProgressRepository, StorageError};

use crate::Clock;
use crate::error::ExamSessionError;
use crate::exam_source::ExamSource;

/// Delay between a correct answer and the move to the next question.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(150);

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    CatalogLoaded,
    QuestionsLoading,
    QuestionsReady,
}

/// Where the question list of the last load came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Saved,
    Fetched,
}

/// Result of moving to a question. The presentation layer scrolls the pager
/// entry at `index` into view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub index: usize,
    pub fragment: Fragment,
}

/// A move to the next question scheduled by a correct answer.
///
/// Only honored by `ExamSession::apply_auto_advance` while nothing else has
/// moved the session since it was issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAdvance {
    pub exam_id: ExamId,
    pub target: i64,
    pub delay: Duration,
    generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub outcome: ChoiceOutcome,
    pub advance: Option<PendingAdvance>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Navigated(Navigation),
    Selected(Selection),
    Ignored,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Controller for the exam being viewed.
///
/// Keeps the in-memory `Session` consistent with the location fragment and the
/// progress store. All mutation goes through `&mut self`, so callers sharing
/// it must hand it around rather than clone it.
pub struct ExamSession {
    clock: Clock,
    source: Arc<dyn ExamSource>,
    progress: Arc<dyn ProgressRepository>,
    auto_advance_delay: Duration,
    catalog: Option<ExamCatalog>,
    meta: Option<ExamMeta>,
    session: Session,
    fragment: Fragment,
    phase: SessionPhase,
    generation: u64,
}

impl ExamSession {
    #[must_use]
    pub fn new(
        clock: Clock,
        source: Arc<dyn ExamSource>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            source,
            progress,
            auto_advance_delay: AUTO_ADVANCE_DELAY,
            catalog: None,
            meta: None,
            session: Session::default(),
            fragment: Fragment::default(),
            phase: SessionPhase::Uninitialized,
            generation: 0,
        }
    }

    #[must_use]
    pub fn with_auto_advance_delay(mut self, delay: Duration) -> Self {
        self.auto_advance_delay = delay;
        self
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::QuestionsReady
    }

    #[must_use]
    pub fn catalog(&self) -> Option<&ExamCatalog> {
        self.catalog.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn exam_id(&self) -> &ExamId {
        self.session.exam_id()
    }

    /// Metadata of the current exam, once it has been resolved in the catalog.
    #[must_use]
    pub fn meta(&self) -> Option<&ExamMeta> {
        self.meta.as_ref()
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.meta.as_ref().map_or(Direction::Ltr, ExamMeta::dir)
    }

    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.meta.as_ref().map(ExamMeta::lang)
    }

    /// The fragment as last written or loaded.
    #[must_use]
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Fetch the catalog, then load the exam the fragment points at.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Source` if the catalog cannot be fetched, or
    /// any error of `load_questions`.
    pub async fn load_catalog(&mut self, fragment: Fragment) -> Result<LoadSource, ExamSessionError> {
        tracing::info!("fetching exams index");
        let catalog = self.source.fetch_catalog().await.inspect_err(|err| {
            tracing::error!("could not fetch exam catalog: {err}");
        })?;
        tracing::debug!("exam catalog has {} exams", catalog.len());
        self.catalog = Some(catalog);
        self.phase = SessionPhase::CatalogLoaded;
        self.load_questions(fragment).await
    }

    /// Re-derive the whole session from `fragment`.
    ///
    /// Saved progress wins over the exam source; a malformed save is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::UnknownExam` if the exam is not in the catalog,
    /// `ExamSessionError::Source` or `ExamSessionError::Question` if fetching or
    /// numbering fails, and `ExamSessionError::Storage` for storage failures other
    /// than malformed data.
    pub async fn load_questions(&mut self, fragment: Fragment) -> Result<LoadSource, ExamSessionError> {
        let exam_id = fragment.exam_id().clone();
        let meta = self
            .catalog
            .as_ref()
            .ok_or(ExamSessionError::CatalogNotLoaded)?
            .meta(&exam_id)
            .ok()
            .cloned();
        let requested = fragment.requested_index();
        tracing::info!("load with fragment {fragment}");

        self.generation += 1;
        self.session = Session::pending(exam_id.clone());
        self.fragment = fragment;
        self.meta = meta;

        if self.meta.is_none() {
            tracing::error!("unknown exam={exam_id}");
            self.phase = SessionPhase::CatalogLoaded;
            return Err(ExamSessionError::UnknownExam(exam_id));
        }
        self.phase = SessionPhase::QuestionsLoading;

        match self.progress.load_progress(&exam_id).await {
            Ok(Some(record)) => {
                tracing::info!("restoring exam={exam_id} from saved progress");
                self.session.replace_questions(record.questions, requested);
                self.phase = SessionPhase::QuestionsReady;
                return Ok(LoadSource::Saved);
            }
            Ok(None) => {}
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!("ignoring malformed saved progress for exam={exam_id}: {reason}");
            }
            Err(err) => {
                tracing::error!("could not read saved progress for exam={exam_id}: {err}");
                return Err(err.into());
            }
        }

        tracing::info!("fetching questions for exam={exam_id}");
        let fetched = match self.source.fetch_questions(&exam_id).await {
            Ok(drafts) => Question::number_fetched(drafts).map_err(ExamSessionError::from),
            Err(err) => Err(err.into()),
        };
        let questions = match fetched {
            Ok(questions) => questions,
            Err(err) => {
                tracing::error!("could not load questions for exam={exam_id}: {err}");
                self.phase = SessionPhase::CatalogLoaded;
                return Err(err);
            }
        };
        self.session.replace_questions(questions, requested);
        self.phase = SessionPhase::QuestionsReady;
        Ok(LoadSource::Fetched)
    }

    /// Move to question `target`, clamping anything out of range to the first one.
    ///
    /// Cancels a pending auto-advance.
    pub fn navigate_to(&mut self, target: Option<i64>) -> Navigation {
        self.generation += 1;
        let index = self.session.navigate_to(target);
        self.fragment = self.session.page_link(index);
        tracing::debug!("changed to {}", index + 1);
        Navigation {
            index,
            fragment: self.fragment.clone(),
        }
    }

    /// Record the option at `option_index` (0-based) for the current question and
    /// save the whole question list.
    ///
    /// A correct choice comes back with a `PendingAdvance` to the next question.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::NoQuestions` if nothing is loaded, or
    /// `ExamSessionError::Storage` if the save fails. The choice stays recorded
    /// in memory either way.
    pub async fn select_option(&mut self, option_index: usize) -> Result<Selection, ExamSessionError> {
        let outcome = self
            .session
            .record_choice(option_index)
            .ok_or(ExamSessionError::NoQuestions)?;
        self.generation += 1;
        let exam_id = self.session.exam_id().clone();
        tracing::debug!(
            "exam={exam_id} question={} choice={} correct={}",
            outcome.question_index + 1,
            outcome.choice,
            outcome.correct
        );

        let record = ProgressRecord::new(
            exam_id.clone(),
            self.session.questions().to_vec(),
            self.clock.now(),
        );
        self.progress.save_progress(&record).await.inspect_err(|err| {
            tracing::error!("could not save progress for exam={exam_id}: {err}");
        })?;

        let advance = outcome.correct.then(|| PendingAdvance {
            exam_id,
            target: i64::try_from(outcome.question_index).map_or(i64::MAX, |i| i.saturating_add(1)),
            delay: self.auto_advance_delay,
            generation: self.generation,
        });
        Ok(Selection { outcome, advance })
    }

    /// Carry out a scheduled advance if nothing has moved the session since.
    pub fn apply_auto_advance(&mut self, pending: &PendingAdvance) -> Option<Navigation> {
        if pending.generation != self.generation || pending.exam_id != *self.session.exam_id() {
            tracing::debug!("dropping stale auto-advance to {}", pending.target + 1);
            return None;
        }
        Some(self.navigate_to(Some(pending.target)))
    }

    /// Forget saved progress for the current exam and load it fresh.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Storage` if the save cannot be removed, or any
    /// error of `load_questions`.
    pub async fn reset_exam(&mut self) -> Result<LoadSource, ExamSessionError> {
        let exam_id = self.session.exam_id().clone();
        tracing::info!("resetting exam={exam_id}");
        self.progress.remove_progress(&exam_id).await?;
        self.load_questions(self.fragment.clone()).await
    }

    /// Open another exam at its first question.
    ///
    /// # Errors
    ///
    /// Returns any error of `load_questions`.
    pub async fn switch_exam(&mut self, exam_id: ExamId) -> Result<LoadSource, ExamSessionError> {
        self.load_questions(Fragment::for_page(exam_id, 0)).await
    }

    /// React to a fragment changed outside the app (history moves, pasted links).
    ///
    /// Returns `true` when the session was re-derived, `false` when the fragment
    /// already describes the current state.
    ///
    /// # Errors
    ///
    /// Returns `ExamSessionError::Fragment` for an unparsable URL, or any error of
    /// `load_questions`.
    pub async fn sync_fragment(&mut self, raw: &str) -> Result<bool, ExamSessionError> {
        let fragment = Fragment::from_location(raw)?;
        if self.is_ready() && fragment == self.fragment {
            return Ok(false);
        }
        tracing::info!("fragment changed to {fragment}");
        self.load_questions(fragment).await?;
        Ok(true)
    }

    /// Handle a key press named as in `KeyboardEvent.key`.
    ///
    /// Digits beyond the current question's options are ignored.
    ///
    /// # Errors
    ///
    /// Returns any error of `select_option`.
    pub async fn handle_key(&mut self, key: &str) -> Result<KeyOutcome, ExamSessionError> {
        if !self.is_ready() {
            return Ok(KeyOutcome::Ignored);
        }
        match KeyCommand::from_key(key, self.direction()) {
            Some(KeyCommand::Step(delta)) => {
                let current = i64::try_from(self.session.current_index()).unwrap_or(i64::MAX);
                Ok(KeyOutcome::Navigated(
                    self.navigate_to(Some(current.saturating_add(delta))),
                ))
            }
            Some(KeyCommand::Choose(option_index)) => {
                let options = self
                    .session
                    .current_question()
                    .map_or(0, |q| q.options().len());
                if options > 0 && option_index >= options {
                    return Ok(KeyOutcome::Ignored);
                }
                Ok(KeyOutcome::Selected(self.select_option(option_index).await?))
            }
            None => Ok(KeyOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam_source::StaticExamSource;
    use exam_core::model::QuestionDraft;
    use exam_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn source() -> StaticExamSource {
        let catalog = ExamCatalog::from_json(r#"{ "quiz": { "lang": "en", "dir": "ltr" } }"#).unwrap();
        let drafts = QuestionDraft::list_from_json(
            r#"[{ "options": ["a", "b"], "answer": 1 }, { "options": ["a", "b"], "answer": 2 }]"#,
        )
        .unwrap();
        StaticExamSource::new(catalog).with_questions(ExamId::new("quiz"), drafts)
    }

    fn exam_session(source: &StaticExamSource) -> ExamSession {
        ExamSession::new(
            fixed_clock(),
            Arc::new(source.clone()),
            Arc::new(InMemoryRepository::new()),
        )
    }

    #[tokio::test]
    async fn load_questions_requires_catalog() {
        let source = source();
        let mut session = exam_session(&source);
        let err = session.load_questions(Fragment::parse("#quiz#1")).await.unwrap_err();
        assert!(matches!(err, ExamSessionError::CatalogNotLoaded));
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
    }

    #[tokio::test]
    async fn phases_progress_to_ready() {
        let source = source();
        let mut session = exam_session(&source);
        session.load_catalog(Fragment::parse("#quiz#2")).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::QuestionsReady);
        assert_eq!(session.session().current_index(), 1);
    }

    #[tokio::test]
    async fn stale_advance_is_dropped_after_manual_navigation() {
        let source = source();
        let mut session = exam_session(&source);
        session.load_catalog(Fragment::parse("#quiz#1")).await.unwrap();

        let selection = session.select_option(0).await.unwrap();
        let pending = selection.advance.expect("correct answer schedules advance");

        session.navigate_to(Some(0));
        assert_eq!(session.apply_auto_advance(&pending), None);
        assert_eq!(session.session().current_index(), 0);
    }

    #[tokio::test]
    async fn digits_past_last_option_are_ignored() {
        let source = source();
        let mut session = exam_session(&source);
        session.load_catalog(Fragment::parse("#quiz#1")).await.unwrap();

        let outcome = session.handle_key("3").await.unwrap();
        assert_eq!(outcome, KeyOutcome::Ignored);
        assert_eq!(session.session().questions()[0].user_choice(), 0);
    }

    #[tokio::test]
    async fn invalid_question_data_drops_back_to_catalog() {
        let catalog = ExamCatalog::from_json(r#"{ "broken": {} }"#).unwrap();
        let drafts =
            QuestionDraft::list_from_json(r#"[{ "options": ["a"], "answer": 2 }]"#).unwrap();
        let source = StaticExamSource::new(catalog).with_questions(ExamId::new("broken"), drafts);
        let mut session = exam_session(&source);

        let err = session.load_catalog(Fragment::parse("#broken#1")).await.unwrap_err();
        assert!(matches!(err, ExamSessionError::Question(_)));
        assert_eq!(session.phase(), SessionPhase::CatalogLoaded);
        assert!(!session.is_ready());
    }

    #[tokio::test]
    async fn keys_are_ignored_before_ready() {
        let source = source();
        let mut session = exam_session(&source);
        assert_eq!(session.handle_key("ArrowRight").await.unwrap(), KeyOutcome::Ignored);
    }
}
