use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ExamId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("unknown exam: {0:?}")]
    UnknownExam(ExamId),

    #[error("invalid exam catalog: {0}")]
    Malformed(String),
}

//
// ─── DIRECTION ─────────────────────────────────────────────────────────────────
//

/// Reading direction of an exam's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Signed step for "forward" in this direction.
    #[must_use]
    pub const fn forward_step(self) -> i64 {
        match self {
            Direction::Ltr => 1,
            Direction::Rtl => -1,
        }
    }

    /// The value of the HTML `dir` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

//
// ─── META ──────────────────────────────────────────────────────────────────────
//

fn default_lang() -> String {
    "en".to_string()
}

/// Display metadata for one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamMeta {
    #[serde(default = "default_lang")]
    lang: String,
    #[serde(default)]
    dir: Direction,
}

impl ExamMeta {
    #[must_use]
    pub fn new(lang: impl Into<String>, dir: Direction) -> Self {
        Self {
            lang: lang.into(),
            dir,
        }
    }

    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    #[must_use]
    pub fn dir(&self) -> Direction {
        self.dir
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// All exams available in this session, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamCatalog {
    exams: BTreeMap<ExamId, ExamMeta>,
}

impl ExamCatalog {
    #[must_use]
    pub fn new(exams: BTreeMap<ExamId, ExamMeta>) -> Self {
        Self { exams }
    }

    /// Parse the catalog index document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Malformed` if the document is not an object of exam metadata.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|err| CatalogError::Malformed(err.to_string()))
    }

    /// Look up metadata for an exam.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownExam` if the id is not in the catalog.
    pub fn meta(&self, id: &ExamId) -> Result<&ExamMeta, CatalogError> {
        self.exams
            .get(id)
            .ok_or_else(|| CatalogError::UnknownExam(id.clone()))
    }

    #[must_use]
    pub fn contains(&self, id: &ExamId) -> bool {
        self.exams.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExamId, &ExamMeta)> {
        self.exams.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }
}

impl FromIterator<(ExamId, ExamMeta)> for ExamCatalog {
    fn from_iter<T: IntoIterator<Item = (ExamId, ExamMeta)>>(iter: T) -> Self {
        Self {
            exams: iter.into_iter().collect(),
        }
    }
}
