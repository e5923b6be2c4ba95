use dioxus::document::eval;
use dioxus::prelude::*;

use exam_core::keyboard::KeyCommand;
use exam_core::model::ExamId;

use crate::views::{ViewError, ViewState};
use crate::vm::{ExamIntent, ExamPageVm, ExamPickerItemVm, OptionVm, PageVm};

use super::controller::{ExamController, use_exam_controller};
use super::scripts::{center_page_script, document_locale_script, focus_root_script};

#[component]
pub fn ExamView() -> Element {
    use_exam_controller();
    rsx! { ExamPanel {} }
}

/// Renders whatever the exam controller in context last published.
#[component]
pub fn ExamPanel() -> Element {
    let controller = use_context::<ExamController>();
    let page_signal = controller.page();
    let mut last_centered = use_signal(|| None::<(ExamId, usize)>);

    use_effect(move || {
        let _ = eval(focus_root_script());
    });

    use_effect(move || {
        let guard = page_signal.read();
        let Some(page) = guard.as_ref() else {
            return;
        };
        let key = (page.exam_id.clone(), page.current_index);
        if last_centered.peek().as_ref() == Some(&key) {
            return;
        }
        let _ = eval(&document_locale_script(&page.lang, page.dir.as_str()));
        let _ = eval(&center_page_script(key.1));
        last_centered.set(Some(key));
    });

    let on_intent = use_callback({
        let controller = controller.clone();
        move |intent: ExamIntent| {
            tracing::debug!("exam intent {intent:?}");
            controller.send(intent);
        }
    });

    let on_key = use_callback(move |evt: KeyboardEvent| {
        let Some(dir) = page_signal.read().as_ref().map(|page| page.dir) else {
            return;
        };
        let key = evt.data.key().to_string();
        if KeyCommand::from_key(&key, dir).is_none() {
            return;
        }
        evt.prevent_default();
        on_intent.call(ExamIntent::Key(key));
    });

    let state = controller.state();
    let error = controller.error();
    let page = page_signal.read().clone();

    rsx! {
        div { class: "page exam-root", id: "exam-root", tabindex: "0", onkeydown: on_key,
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "exam-error", "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| controller.retry(),
                        "Retry"
                    }
                },
                ViewState::Ready(()) => rsx! {
                    if let Some(page) = page {
                        ExamScreen { page, error, on_intent }
                    } else {
                        p { "Loading..." }
                    }
                },
            }
        }
    }
}

#[component]
fn ExamScreen(
    page: ExamPageVm,
    error: Option<ViewError>,
    on_intent: EventHandler<ExamIntent>,
) -> Element {
    let progress = page.progress;
    let progress_label = format!("{}/{} answered", progress.answered, progress.total);
    let score_label = format!("{} correct, {} wrong", progress.correct, progress.incorrect);
    let title = if page.exam_id.is_empty() {
        "No exam selected".to_string()
    } else {
        page.exam_id.to_string()
    };
    let dir = page.dir.as_str();
    let lang = page.lang.clone();
    let number_label = format!("Question {} of {}", page.number, progress.total);

    rsx! {
        header { class: "exam-header",
            ExamPicker { exams: page.exams.clone(), on_intent }
            h1 { class: "exam-header__title", "{title}" }
            if page.ready {
                span { class: "exam-header__progress", "{progress_label}" }
                span { class: "exam-header__score", "{score_label}" }
            }
        }
        nav { class: "exam-history",
            button {
                class: "exam-history__back",
                id: "exam-back",
                r#type: "button",
                disabled: !page.can_go_back,
                onclick: move |_| on_intent.call(ExamIntent::Back),
                "Back"
            }
            button {
                class: "exam-history__forward",
                id: "exam-forward",
                r#type: "button",
                disabled: !page.can_go_forward,
                onclick: move |_| on_intent.call(ExamIntent::Forward),
                "Forward"
            }
            code { class: "exam-history__link", "{page.link}" }
        }
        if let Some(err) = error {
            p { class: "exam-error", "{err.message()}" }
        }
        if page.ready {
            div { class: "exam-pages", id: "exam-pages", dir: "{dir}",
                for item in page.pages.iter() {
                    PageButton { key: "{item.index}", item: item.clone(), on_intent }
                }
            }
            section { class: "exam-question", lang: "{lang}", dir: "{dir}",
                h2 { class: "exam-question__number", "{number_label}" }
                if let Some(prompt) = page.prompt.clone() {
                    p { class: "exam-question__prompt", "{prompt}" }
                }
                ol { class: "exam-options",
                    for option in page.options.iter() {
                        OptionButton { key: "{option.index}", option: option.clone(), on_intent }
                    }
                }
            }
            footer { class: "exam-footer",
                button {
                    class: "exam-reset",
                    id: "exam-reset",
                    r#type: "button",
                    onclick: move |_| on_intent.call(ExamIntent::Reset),
                    "Reset"
                }
            }
        } else {
            p { class: "exam-empty", "Choose an exam to begin." }
        }
    }
}

#[component]
fn ExamPicker(exams: Vec<ExamPickerItemVm>, on_intent: EventHandler<ExamIntent>) -> Element {
    rsx! {
        div { class: "exam-picker",
            for item in exams.iter() {
                PickerItem { key: "{item.id}", item: item.clone(), on_intent }
            }
        }
    }
}

#[component]
fn PickerItem(item: ExamPickerItemVm, on_intent: EventHandler<ExamIntent>) -> Element {
    let class = if item.selected {
        "exam-picker__item exam-picker__item--selected"
    } else {
        "exam-picker__item"
    };
    let label = item.id.to_string();
    let id = item.id;
    rsx! {
        button {
            class: "{class}",
            r#type: "button",
            onclick: move |_| on_intent.call(ExamIntent::SwitchExam(id.clone())),
            "{label}"
        }
    }
}

#[component]
fn PageButton(item: PageVm, on_intent: EventHandler<ExamIntent>) -> Element {
    let index = item.index;
    rsx! {
        button {
            class: "{item.class}",
            id: "page-{index}",
            r#type: "button",
            title: "{item.link}",
            onclick: move |_| on_intent.call(ExamIntent::ShowPage(index)),
            "{item.number}"
        }
    }
}

#[component]
fn OptionButton(option: OptionVm, on_intent: EventHandler<ExamIntent>) -> Element {
    let index = option.index;
    rsx! {
        li { class: "{option.class}",
            button {
                r#type: "button",
                onclick: move |_| on_intent.call(ExamIntent::Choose(index)),
                span { class: "exam-option__number", "{option.number}" }
                span { class: "exam-option__label", "{option.label}" }
            }
        }
    }
}
