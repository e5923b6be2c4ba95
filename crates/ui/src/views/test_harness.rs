use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use exam_core::fragment::Fragment;
use exam_core::model::{ExamCatalog, ExamId, QuestionDraft};
use exam_core::time::fixed_clock;
use services::{AppServices, StaticExamSource};
use storage::repository::Storage;

use crate::context::{UiApp, build_app_context};
use crate::views::exam::{ExamPanel, use_exam_controller};
use crate::vm::ExamIntent;

#[derive(Clone)]
struct TestApp {
    services: AppServices,
    fragment: Fragment,
}

impl UiApp for TestApp {
    fn services(&self) -> AppServices {
        self.services.clone()
    }

    fn initial_fragment(&self) -> Fragment {
        self.fragment.clone()
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    intents: Vec<ExamIntent>,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ExamHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! {
        ScriptedExam { intents: props.intents.clone() }
    }
}

/// Exam view whose controller receives `intents` before any input arrives.
#[component]
fn ScriptedExam(intents: Vec<ExamIntent>) -> Element {
    let controller = use_exam_controller();
    use_hook(move || {
        for intent in intents {
            controller.send(intent);
        }
    });
    rsx! { ExamPanel {} }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
    pub source: StaticExamSource,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild and poll until the initial load has settled.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    /// Poll until `done` accepts the rendered html, returning the last render.
    pub async fn settle_until(&mut self, done: impl Fn(&str) -> bool) -> String {
        self.rebuild();
        for _ in 0..40 {
            self.drive_async().await;
            let html = self.render();
            if done(&html) {
                return html;
            }
        }
        self.render()
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn sample_source() -> StaticExamSource {
    let catalog = ExamCatalog::from_json(
        r#"{
            "math101": { "lang": "en", "dir": "ltr" },
            "hebrew": { "lang": "he", "dir": "rtl" }
        }"#,
    )
    .expect("catalog");
    let drafts = QuestionDraft::list_from_json(
        r#"[
            { "question": "What is 1 + 1?", "options": ["1", "2", "3"], "answer": 2 },
            { "question": "What is 2 * 3?", "options": ["5", "6"], "answer": 2 },
            { "question": "What is 9 - 4?", "options": ["5", "4", "3"], "answer": 1 }
        ]"#,
    )
    .expect("drafts");
    StaticExamSource::new(catalog)
        .with_questions(ExamId::new("math101"), drafts.clone())
        .with_questions(ExamId::new("hebrew"), drafts)
}

pub fn setup_view_harness(fragment: &str) -> ViewHarness {
    setup_view_harness_with(sample_source(), Storage::in_memory(), fragment)
}

pub fn setup_view_harness_with(
    source: StaticExamSource,
    storage: Storage,
    fragment: &str,
) -> ViewHarness {
    setup_scripted_harness(source, storage, fragment, Vec::new())
}

pub fn setup_scripted_harness(
    source: StaticExamSource,
    storage: Storage,
    fragment: &str,
    intents: Vec<ExamIntent>,
) -> ViewHarness {
    let services = AppServices::new(fixed_clock(), Arc::new(source.clone()), storage.clone());
    let app = Arc::new(TestApp {
        services,
        fragment: Fragment::parse(fragment),
    });
    let dom = VirtualDom::new_with_props(ExamHarness, ViewHarnessProps { app, intents });

    ViewHarness {
        dom,
        storage,
        source,
    }
}
