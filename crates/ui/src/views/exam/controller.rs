use dioxus::prelude::*;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Instant;

use exam_core::fragment::Fragment;
use services::{ExamSession, PendingAdvance};

use crate::context::AppContext;
use crate::views::{ViewError, ViewState};
use crate::vm::{ExamIntent, ExamPageVm, ExamVm};

#[derive(Debug)]
enum ExamCommand {
    Open,
    Intent(ExamIntent),
}

enum Step {
    Command(Option<ExamCommand>),
    Advance,
}

#[derive(Clone, Copy)]
struct ExamSignals {
    state: Signal<ViewState<()>>,
    page: Signal<Option<ExamPageVm>>,
    error: Signal<Option<ViewError>>,
}

impl ExamSignals {
    async fn open(&mut self, exam: &mut ExamVm, fragment: Fragment) {
        self.state.set(ViewState::Loading);
        let state = match exam.open(fragment).await {
            Ok(()) => {
                self.error.set(None);
                ViewState::Ready(())
            }
            // The picker still works without a valid exam.
            Err(err) if exam.has_catalog() => {
                self.error.set(Some(err));
                ViewState::Ready(())
            }
            Err(err) => ViewState::Error(err),
        };
        self.page.set(Some(exam.page()));
        self.state.set(state);
    }
}

/// Handle to the task that owns the exam view model.
///
/// Intents are queued and applied one at a time. The last published page
/// stays readable while an intent is in flight.
#[derive(Clone)]
pub struct ExamController {
    signals: ExamSignals,
    commands: UnboundedSender<ExamCommand>,
}

impl ExamController {
    #[must_use]
    pub fn state(&self) -> ViewState<()> {
        self.signals.state.read().clone()
    }

    #[must_use]
    pub fn page(&self) -> Signal<Option<ExamPageVm>> {
        self.signals.page
    }

    #[must_use]
    pub fn error(&self) -> Option<ViewError> {
        *self.signals.error.read()
    }

    pub fn send(&self, intent: ExamIntent) {
        self.push(ExamCommand::Intent(intent));
    }

    pub fn retry(&self) {
        self.push(ExamCommand::Open);
    }

    fn push(&self, command: ExamCommand) {
        if let Err(err) = self.commands.send(command) {
            tracing::warn!("exam task stopped, dropping {:?}", err.0);
        }
    }
}

/// Start the exam task for this scope and provide its controller to children.
pub fn use_exam_controller() -> ExamController {
    let ctx = use_context::<AppContext>();
    let signals = ExamSignals {
        state: use_signal(|| ViewState::Loading),
        page: use_signal(|| None),
        error: use_signal(|| None),
    };

    use_context_provider(move || {
        let (commands, receiver) = unbounded_channel();
        spawn(run_exam(
            ctx.exam_session(),
            ctx.initial_fragment(),
            receiver,
            signals,
        ));
        ExamController { signals, commands }
    })
}

async fn run_exam(
    session: ExamSession,
    fragment: Fragment,
    mut commands: UnboundedReceiver<ExamCommand>,
    mut signals: ExamSignals,
) {
    let mut exam = ExamVm::new(session);
    let mut scheduled: Option<(PendingAdvance, Instant)> = None;
    signals.open(&mut exam, fragment.clone()).await;

    loop {
        let step = match &scheduled {
            Some((_, deadline)) => {
                let deadline = *deadline;
                tokio::select! {
                    command = commands.recv() => Step::Command(command),
                    () = tokio::time::sleep_until(deadline) => Step::Advance,
                }
            }
            None => Step::Command(commands.recv().await),
        };

        match step {
            Step::Advance => {
                if let Some((pending, _)) = scheduled.take() {
                    if !exam.apply_advance(&pending) {
                        tracing::debug!("auto-advance superseded by a later change");
                    }
                }
            }
            Step::Command(None) => break,
            Step::Command(Some(ExamCommand::Open)) => {
                scheduled = None;
                signals.open(&mut exam, fragment.clone()).await;
                continue;
            }
            Step::Command(Some(ExamCommand::Intent(intent))) => match exam.apply(intent).await {
                Ok(advance) => {
                    signals.error.set(None);
                    if let Some(pending) = advance {
                        let deadline = Instant::now() + pending.delay;
                        scheduled = Some((pending, deadline));
                    }
                }
                Err(err) => signals.error.set(Some(err)),
            },
        }

        signals.page.set(Some(exam.page()));
    }
}
