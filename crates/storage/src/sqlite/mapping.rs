use chrono::{DateTime, Utc};
use exam_core::model::ExamId;
use sqlx::Row;

use crate::repository::{ProgressRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_progress_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord, StorageError> {
    let exam_id = ExamId::new(row.try_get::<String, _>("exam_id").map_err(ser)?);
    let questions_json: String = row.try_get("questions_json").map_err(ser)?;
    let saved_at: DateTime<Utc> = row.try_get("saved_at").map_err(ser)?;
    ProgressRecord::decode(exam_id, &questions_json, saved_at)
}
