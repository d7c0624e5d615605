//! Per-call lifecycle hooks
//!
//! UI code uses these to toggle spinners and show errors. `on_start` fires
//! once before the first attempt, `on_error` at most once with the failure
//! message, and `on_finish` exactly once on every exit path. `on_finish` runs
//! from a drop guard, so it also fires when the call future is dropped
//! mid-flight.

use std::fmt;

type StartHook = Box<dyn FnOnce() + Send>;
type ErrorHook = Box<dyn FnOnce(&str) + Send>;
type FinishHook = Box<dyn FnOnce() + Send>;

/// Optional callbacks attached to a single request.
#[derive(Default)]
pub struct Hooks {
    on_start: Option<StartHook>,
    on_error: Option<ErrorHook>,
    on_finish: Option<FinishHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl FnOnce(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn on_finish(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_start", &self.on_start.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Running call's hooks. Created by firing `on_start`; fires `on_finish` on
/// drop.
pub(crate) struct Lifecycle {
    on_error: Option<ErrorHook>,
    on_finish: Option<FinishHook>,
}

impl Lifecycle {
    pub(crate) fn start(hooks: Hooks) -> Self {
        let Hooks {
            on_start,
            on_error,
            on_finish,
        } = hooks;
        // Guard is armed before on_start runs
        let lifecycle = Self {
            on_error,
            on_finish,
        };
        if let Some(hook) = on_start {
            hook();
        }
        lifecycle
    }

    /// Fire `on_error`. Later calls are ignored.
    pub(crate) fn fail(&mut self, message: &str) {
        if let Some(hook) = self.on_error.take() {
            hook(message);
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if let Some(hook) = self.on_finish.take() {
            hook();
        }
    }
}
