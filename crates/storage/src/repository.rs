use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{ExamId, Question};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Saved answers for one exam.
///
/// The whole question list is stored, so a restore brings back every
/// `user_choice` exactly as it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub exam_id: ExamId,
    pub questions: Vec<Question>,
    pub saved_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(exam_id: ExamId, questions: Vec<Question>, saved_at: DateTime<Utc>) -> Self {
        Self {
            exam_id,
            questions,
            saved_at,
        }
    }

    /// Serialize the question list into its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode_questions(&self) -> Result<String, StorageError> {
        serde_json::to_string(&self.questions)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Rebuild a record from its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the JSON does not decode or the
    /// decoded questions break numbering invariants.
    pub fn decode(
        exam_id: ExamId,
        questions_json: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        let questions: Vec<Question> = serde_json::from_str(questions_json)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Question::validate_saved(&questions)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Self::new(exam_id, questions, saved_at))
    }
}

/// Repository contract for per-exam saved progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the saved progress for an exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored data is malformed,
    /// or other storage errors.
    async fn load_progress(&self, exam_id: &ExamId) -> Result<Option<ProgressRecord>, StorageError>;

    /// Persist progress, replacing any earlier save for the same exam.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Forget the saved progress for an exam. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the removal fails.
    async fn remove_progress(&self, exam_id: &ExamId) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Saves are kept in their encoded JSON form, like the persistent backends.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<ExamId, (String, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store an encoded save as-is, bypassing validation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_raw(
        &self,
        exam_id: ExamId,
        questions_json: impl Into<String>,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(exam_id, (questions_json.into(), saved_at));
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self, exam_id: &ExamId) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(exam_id)
            .map(|(json, saved_at)| ProgressRecord::decode(exam_id.clone(), json, *saved_at))
            .transpose()
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let json = record.encode_questions()?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.exam_id.clone(), (json, record.saved_at));
        Ok(())
    }

    async fn remove_progress(&self, exam_id: &ExamId) -> Result<bool, StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(exam_id).is_some())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionDraft;
    use exam_core::time::fixed_now;

    fn build_questions() -> Vec<Question> {
        let drafts = QuestionDraft::list_from_json(
            r#"[{ "question": "a?", "answer": 1 }, { "question": "b?", "answer": 2 }]"#,
        )
        .unwrap();
        Question::number_fetched(drafts).unwrap()
    }

    #[tokio::test]
    async fn round_trips_progress_with_choices() {
        let repo = InMemoryRepository::new();
        let exam_id = ExamId::new("midterm");
        let mut questions = build_questions();
        questions[1].choose(1);

        let record = ProgressRecord::new(exam_id.clone(), questions.clone(), fixed_now());
        repo.save_progress(&record).await.unwrap();

        let fetched = repo.load_progress(&exam_id).await.unwrap().expect("saved");
        assert_eq!(fetched.questions, questions);
        assert_eq!(fetched.questions[1].user_choice(), 1);
        assert_eq!(fetched.saved_at, fixed_now());
    }

    #[tokio::test]
    async fn missing_progress_is_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_progress(&ExamId::new("x")).await.unwrap().is_none());
        assert!(!repo.remove_progress(&ExamId::new("x")).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_save_is_a_serialization_error() {
        let repo = InMemoryRepository::new();
        let exam_id = ExamId::new("broken");
        repo.insert_raw(exam_id.clone(), "{not json", fixed_now())
            .unwrap();

        let err = repo.load_progress(&exam_id).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn remove_forgets_progress() {
        let repo = InMemoryRepository::new();
        let exam_id = ExamId::new("midterm");
        let record = ProgressRecord::new(exam_id.clone(), build_questions(), fixed_now());
        repo.save_progress(&record).await.unwrap();

        assert!(repo.remove_progress(&exam_id).await.unwrap());
        assert!(repo.load_progress(&exam_id).await.unwrap().is_none());
    }
}
