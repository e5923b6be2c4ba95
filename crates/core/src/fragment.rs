//! Deep-link fragments of the form `#<exam>#<question number>`.

use std::fmt;

use thiserror::Error;
use url::Url;

use crate::model::ExamId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FragmentError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Navigation intent encoded in the location fragment.
///
/// `question_number` is 1-based as written; it is `None` when the segment is
/// missing or does not start with an integer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    exam_id: ExamId,
    question_number: Option<i64>,
}

impl Fragment {
    #[must_use]
    pub fn new(exam_id: ExamId, question_number: Option<i64>) -> Self {
        Self {
            exam_id,
            question_number,
        }
    }

    /// Fragment addressing the 0-based question `index` of `exam_id`.
    #[must_use]
    pub fn for_page(exam_id: ExamId, index: usize) -> Self {
        let number = i64::try_from(index).map_or(i64::MAX, |i| i.saturating_add(1));
        Self::new(exam_id, Some(number))
    }

    /// Parse the raw fragment (including its leading `#`).
    ///
    /// The text is split on `#`: the second piece names the exam and the third
    /// carries the question number. Missing pieces fall back to an empty exam
    /// id and no number.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('#').skip(1);
        let exam_id = ExamId::new(parts.next().unwrap_or_default());
        let question_number = parts.next().and_then(parse_leading_int);
        Self {
            exam_id,
            question_number,
        }
    }

    /// Extract and parse the fragment of a full URL.
    ///
    /// # Errors
    ///
    /// Returns `FragmentError::InvalidUrl` if `raw` is not an absolute URL.
    pub fn from_url(raw: &str) -> Result<Self, FragmentError> {
        let url = Url::parse(raw)?;
        Ok(url
            .fragment()
            .map_or_else(Self::default, |fragment| Self::parse(&format!("#{fragment}"))))
    }

    /// Accept either a bare fragment or a full URL.
    ///
    /// # Errors
    ///
    /// Returns `FragmentError::InvalidUrl` if `raw` looks like a URL but does not parse.
    pub fn from_location(raw: &str) -> Result<Self, FragmentError> {
        let raw = raw.trim();
        if raw.contains("://") {
            Self::from_url(raw)
        } else {
            Ok(Self::parse(raw))
        }
    }

    #[must_use]
    pub fn exam_id(&self) -> &ExamId {
        &self.exam_id
    }

    #[must_use]
    pub fn question_number(&self) -> Option<i64> {
        self.question_number
    }

    /// 0-based index the fragment asks for, before clamping.
    #[must_use]
    pub fn requested_index(&self) -> Option<i64> {
        self.question_number.and_then(|n| n.checked_sub(1))
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.question_number {
            Some(number) => write!(f, "#{}#{number}", self.exam_id),
            None => write!(f, "#{}", self.exam_id),
        }
    }
}

/// Read an optionally signed integer prefix, ignoring leading whitespace.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let value: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -value } else { value })
}
