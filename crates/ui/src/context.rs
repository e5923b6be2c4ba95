use std::sync::Arc;

use exam_core::fragment::Fragment;
use services::{AppServices, ExamSession};

pub trait UiApp: Send + Sync {
    fn services(&self) -> AppServices;

    /// Deep link the window opens at.
    fn initial_fragment(&self) -> Fragment;
}

#[derive(Clone)]
pub struct AppContext {
    services: AppServices,
    initial_fragment: Fragment,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            services: app.services(),
            initial_fragment: app.initial_fragment(),
        }
    }

    #[must_use]
    pub fn services(&self) -> &AppServices {
        &self.services
    }

    /// A fresh session controller over the shared source and progress store.
    #[must_use]
    pub fn exam_session(&self) -> ExamSession {
        self.services.exam_session()
    }

    #[must_use]
    pub fn initial_fragment(&self) -> Fragment {
        self.initial_fragment.clone()
    }
}

// Provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
