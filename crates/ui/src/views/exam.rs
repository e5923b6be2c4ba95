mod controller;
mod scripts;
mod view;

pub use view::ExamView;

#[cfg(test)]
pub(super) use controller::use_exam_controller;
#[cfg(test)]
pub(super) use view::ExamPanel;
