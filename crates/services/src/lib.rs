#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exam_session;
pub mod exam_source;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ExamSessionError, ExamSourceError};
pub use exam_session::{
    AUTO_ADVANCE_DELAY, ExamSession, KeyOutcome, LoadSource, Navigation, PendingAdvance,
    Selection, SessionPhase,
};
pub use exam_source::{
    DirExamSource, EXAM_SOURCE_ENV, ExamSource, ExamSourceConfig, HttpExamSource,
    StaticExamSource,
};
