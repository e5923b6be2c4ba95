#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    UnknownExam,
    InvalidExam,
    Offline,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unknown => "Something went wrong. Please try again.",
            Self::UnknownExam => "Unknown exam. Pick one from the list.",
            Self::InvalidExam => "This exam's questions could not be read. Pick another exam.",
            Self::Offline => "Could not reach the exam source. Check your connection and retry.",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}
