mod exam;
mod ids;
mod question;
mod session;

pub use ids::ExamId;

pub use exam::{CatalogError, Direction, ExamCatalog, ExamMeta};
pub use question::{
    OptionStatus, Question, QuestionDraft, QuestionError, QuestionStatus, option_number,
};
pub use session::{ChoiceOutcome, Session, SessionProgress};
