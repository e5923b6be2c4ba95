use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Identifier of an exam in the catalog.
///
/// Empty is a valid value: it is what a fragment without an exam segment yields.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(String);

impl ExamId {
    /// Creates a new `ExamId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExamId({:?})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ExamId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExamId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for ExamId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
