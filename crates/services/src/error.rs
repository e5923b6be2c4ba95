//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use exam_core::fragment::FragmentError;
use exam_core::model::{ExamId, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by exam sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamSourceError {
    #[error("exam source request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid exam source url: {0}")]
    InvalidBaseUrl(String),
    #[error("exam id {0:?} cannot be used as a file name")]
    InvalidExamId(ExamId),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode exam data: {0}")]
    Decode(String),
    #[error("exam source is offline")]
    Offline,
    #[error("no questions published for exam {0:?}")]
    MissingExam(ExamId),
}

/// Errors emitted by `ExamSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamSessionError {
    #[error("unknown exam: {0:?}")]
    UnknownExam(ExamId),
    #[error("exam catalog has not been loaded")]
    CatalogNotLoaded,
    #[error("no questions loaded")]
    NoQuestions,
    #[error(transparent)]
    Fragment(#[from] FragmentError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Source(#[from] ExamSourceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Source(#[from] ExamSourceError),
}
