use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use exam_core::model::{ExamCatalog, ExamId, QuestionDraft};
use reqwest::Client;
use url::Url;

use crate::error::ExamSourceError;

/// Where exam data is read from.
#[async_trait]
pub trait ExamSource: Send + Sync {
    /// Fetch the catalog of available exams.
    ///
    /// # Errors
    ///
    /// Returns `ExamSourceError` if the catalog cannot be read or decoded.
    async fn fetch_catalog(&self) -> Result<ExamCatalog, ExamSourceError>;

    /// Fetch the question list of one exam, un-numbered.
    ///
    /// # Errors
    ///
    /// Returns `ExamSourceError` if the question list cannot be read or decoded.
    async fn fetch_questions(&self, exam_id: &ExamId)
    -> Result<Vec<QuestionDraft>, ExamSourceError>;
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

pub const EXAM_SOURCE_ENV: &str = "EXAM_SOURCE";

/// Exam source selection: an `http(s)://` base URL or a local directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExamSourceConfig {
    Http(String),
    Directory(PathBuf),
}

impl Default for ExamSourceConfig {
    fn default() -> Self {
        Self::Directory(PathBuf::from("."))
    }
}

impl ExamSourceConfig {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Http(raw.to_string())
        } else {
            Self::Directory(PathBuf::from(raw))
        }
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let raw = env::var(EXAM_SOURCE_ENV).ok()?;
        if raw.trim().is_empty() {
            return None;
        }
        Some(Self::parse(&raw))
    }

    /// Build the configured source.
    ///
    /// # Errors
    ///
    /// Returns `ExamSourceError::InvalidBaseUrl` for an unparsable HTTP base.
    pub fn build(&self) -> Result<Arc<dyn ExamSource>, ExamSourceError> {
        Ok(match self {
            Self::Http(base) => Arc::new(HttpExamSource::new(base)?),
            Self::Directory(root) => Arc::new(DirExamSource::new(root.clone())),
        })
    }
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

/// Reads `<base>/exams.json` and `<base>/exams/<id>.json` over HTTP.
#[derive(Clone)]
pub struct HttpExamSource {
    client: Client,
    base_url: Url,
}

impl HttpExamSource {
    /// # Errors
    ///
    /// Returns `ExamSourceError::InvalidBaseUrl` if `base_url` is not an absolute URL
    /// that can carry path segments.
    pub fn new(base_url: &str) -> Result<Self, ExamSourceError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ExamSourceError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ExamSourceError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, ExamSourceError> {
        let mut url = self.base_url.clone();
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| ExamSourceError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ExamSource for HttpExamSource {
    async fn fetch_catalog(&self) -> Result<ExamCatalog, ExamSourceError> {
        let url = self.url_for(&["exams.json"])?;
        tracing::debug!("fetching exam catalog from {url}");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ExamSourceError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn fetch_questions(
        &self,
        exam_id: &ExamId,
    ) -> Result<Vec<QuestionDraft>, ExamSourceError> {
        let file = format!("{exam_id}.json");
        let url = self.url_for(&["exams", &file])?;
        tracing::debug!("fetching questions for exam={exam_id} from {url}");
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ExamSourceError::MissingExam(exam_id.clone()));
        }
        if !response.status().is_success() {
            return Err(ExamSourceError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

//
// ─── DIRECTORY ─────────────────────────────────────────────────────────────────
//

/// Reads the same layout as `HttpExamSource` from a local directory.
#[derive(Clone, Debug)]
pub struct DirExamSource {
    root: PathBuf,
}

impl DirExamSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read(&self, path: PathBuf) -> Result<String, ExamSourceError> {
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ExamSourceError::Io { path, source })
    }
}

fn is_plain_file_stem(exam_id: &ExamId) -> bool {
    let id = exam_id.as_str();
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

#[async_trait]
impl ExamSource for DirExamSource {
    async fn fetch_catalog(&self) -> Result<ExamCatalog, ExamSourceError> {
        let raw = self.read(self.root.join("exams.json")).await?;
        ExamCatalog::from_json(&raw).map_err(|err| ExamSourceError::Decode(err.to_string()))
    }

    async fn fetch_questions(
        &self,
        exam_id: &ExamId,
    ) -> Result<Vec<QuestionDraft>, ExamSourceError> {
        if !is_plain_file_stem(exam_id) {
            return Err(ExamSourceError::InvalidExamId(exam_id.clone()));
        }
        let path = self.root.join("exams").join(format!("{exam_id}.json"));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExamSourceError::MissingExam(exam_id.clone()));
        }
        let raw = self.read(path).await?;
        QuestionDraft::list_from_json(&raw).map_err(|err| ExamSourceError::Decode(err.to_string()))
    }
}

//
// ─── STATIC ────────────────────────────────────────────────────────────────────
//

/// Fixed in-memory exam data, for tests and demos.
///
/// Counts fetches so callers can tell cache hits from network reads.
#[derive(Clone, Default)]
pub struct StaticExamSource {
    catalog: ExamCatalog,
    questions: HashMap<ExamId, Vec<QuestionDraft>>,
    offline: Arc<AtomicBool>,
    catalog_fetches: Arc<AtomicUsize>,
    question_fetches: Arc<AtomicUsize>,
}

impl StaticExamSource {
    #[must_use]
    pub fn new(catalog: ExamCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_questions(mut self, exam_id: ExamId, questions: Vec<QuestionDraft>) -> Self {
        self.questions.insert(exam_id, questions);
        self
    }

    /// Make every subsequent fetch fail with `ExamSourceError::Offline`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[must_use]
    pub fn catalog_fetches(&self) -> usize {
        self.catalog_fetches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn question_fetches(&self) -> usize {
        self.question_fetches.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), ExamSourceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ExamSourceError::Offline);
        }
        Ok(())
    }
}

#[async_trait]
impl ExamSource for StaticExamSource {
    async fn fetch_catalog(&self) -> Result<ExamCatalog, ExamSourceError> {
        self.ensure_online()?;
        self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.catalog.clone())
    }

    async fn fetch_questions(
        &self,
        exam_id: &ExamId,
    ) -> Result<Vec<QuestionDraft>, ExamSourceError> {
        self.ensure_online()?;
        self.question_fetches.fetch_add(1, Ordering::SeqCst);
        self.questions
            .get(exam_id)
            .cloned()
            .ok_or_else(|| ExamSourceError::MissingExam(exam_id.clone()))
    }
}
