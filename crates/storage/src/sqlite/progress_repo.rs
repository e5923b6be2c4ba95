use async_trait::async_trait;
use exam_core::model::ExamId;

use super::{SqliteRepository, mapping::map_progress_row};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self, exam_id: &ExamId) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT exam_id, questions_json, saved_at
            FROM exam_progress
            WHERE exam_id = ?1
            ",
        )
        .bind(exam_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let questions_json = record.encode_questions()?;
        sqlx::query(
            r"
            INSERT INTO exam_progress (exam_id, questions_json, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(exam_id) DO UPDATE SET
                questions_json = excluded.questions_json,
                saved_at = excluded.saved_at
            ",
        )
        .bind(record.exam_id.as_str())
        .bind(questions_json)
        .bind(record.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn remove_progress(&self, exam_id: &ExamId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM exam_progress WHERE exam_id = ?1")
            .bind(exam_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(res.rows_affected() > 0)
    }
}
