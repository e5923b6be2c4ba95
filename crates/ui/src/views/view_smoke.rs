use exam_core::model::{ExamId, Question, QuestionDraft};
use exam_core::time::fixed_now;
use storage::repository::{ProgressRecord, ProgressRepository, Storage};

use crate::vm::ExamIntent;

use super::test_harness::{
    sample_source, setup_scripted_harness, setup_view_harness, setup_view_harness_with,
};

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_renders_requested_question() {
    let mut harness = setup_view_harness("#math101#2");
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Question 2 of 3"), "missing number in {html}");
    assert!(html.contains("What is 2 * 3?"), "missing prompt in {html}");
    assert!(html.contains("exam-page--current"), "missing current page in {html}");
    assert!(html.contains("#math101#2"), "missing deep link in {html}");
    assert!(html.contains("Reset"), "missing reset in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_restores_saved_choices() {
    let storage = Storage::in_memory();
    let drafts = QuestionDraft::list_from_json(
        r#"[
            { "question": "What is 1 + 1?", "options": ["1", "2", "3"], "answer": 2 },
            { "question": "What is 2 * 3?", "options": ["5", "6"], "answer": 2 },
            { "question": "What is 9 - 4?", "options": ["5", "4", "3"], "answer": 1 }
        ]"#,
    )
    .unwrap();
    let mut questions = Question::number_fetched(drafts).unwrap();
    questions[0].choose(2);
    questions[1].choose(1);
    storage
        .progress
        .save_progress(&ProgressRecord::new(ExamId::new("math101"), questions, fixed_now()))
        .await
        .expect("save progress");

    let mut harness = setup_view_harness_with(sample_source(), storage, "#math101#1");
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("2/3 answered"), "missing progress in {html}");
    assert!(html.contains("1 correct, 1 wrong"), "missing score in {html}");
    assert!(html.contains("exam-page--correct"), "missing correct page in {html}");
    assert!(html.contains("exam-page--incorrect"), "missing incorrect page in {html}");
    assert!(html.contains("exam-option--correct"), "missing correct option in {html}");
    assert_eq!(harness.source.question_fetches(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_unknown_exam_shows_picker() {
    let mut harness = setup_view_harness("#nope#1");
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Unknown exam"), "missing error in {html}");
    assert!(html.contains("Choose an exam to begin."), "missing prompt in {html}");
    assert!(html.contains("hebrew"), "missing picker entry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_smoke_renders_offline_state() {
    let source = sample_source();
    source.set_offline(true);
    let mut harness = setup_view_harness_with(source, Storage::in_memory(), "#math101#1");
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Could not reach the exam source"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_advances_after_correct_choice() {
    let mut harness = setup_scripted_harness(
        sample_source(),
        Storage::in_memory(),
        "#math101#1",
        vec![ExamIntent::Choose(1)],
    );
    let html = harness
        .settle_until(|html| html.contains("Question 2 of 3"))
        .await;

    assert!(html.contains("Question 2 of 3"), "no advance in {html}");
    assert!(html.contains("1 correct, 0 wrong"), "missing score in {html}");
    assert!(html.contains("#math101#2"), "missing deep link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn exam_view_applies_queued_intents_in_order() {
    let mut harness = setup_scripted_harness(
        sample_source(),
        Storage::in_memory(),
        "#math101#1",
        vec![
            ExamIntent::ShowPage(2),
            ExamIntent::Key("ArrowLeft".into()),
            ExamIntent::Choose(0),
        ],
    );
    let html = harness.settle_until(|html| html.contains("1 wrong")).await;

    assert!(html.contains("Question 2 of 3"), "wrong question in {html}");
    assert!(html.contains("0 correct, 1 wrong"), "missing score in {html}");
    assert!(html.contains("exam-option--incorrect"), "missing choice in {html}");
}
