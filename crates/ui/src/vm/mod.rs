mod exam_vm;
mod fragment_history;

pub use exam_vm::{
    ExamIntent, ExamPageVm, ExamPickerItemVm, ExamVm, OptionVm, PageVm, option_class, page_class,
};
pub use fragment_history::FragmentHistory;
