use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::exam_session::ExamSession;
use crate::exam_source::{ExamSource, ExamSourceConfig};

/// Assembles the exam source and progress store the app runs against.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    source: Arc<dyn ExamSource>,
    storage: Storage,
}

impl AppServices {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn ExamSource>, storage: Storage) -> Self {
        Self {
            clock,
            source,
            storage,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the source
    /// configuration is invalid.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        source: &ExamSourceConfig,
    ) -> Result<Self, AppServicesError> {
        let source = source.build()?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(clock, source, storage))
    }

    /// Services over in-memory storage, for tests and throwaway runs.
    #[must_use]
    pub fn in_memory(clock: Clock, source: Arc<dyn ExamSource>) -> Self {
        Self::new(clock, source, Storage::in_memory())
    }

    /// A fresh, uninitialized exam session over these services.
    #[must_use]
    pub fn exam_session(&self) -> ExamSession {
        ExamSession::new(
            self.clock,
            Arc::clone(&self.source),
            Arc::clone(&self.storage.progress),
        )
    }
}
