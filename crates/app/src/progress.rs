//! Step progress reporting shared by the use cases.

use std::sync::Arc;
use svcplus_shared::Result;

/// Progress event emitted while a use case runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A named step began.
    StepStarted {
        /// Status line (e.g. `Starting prometheus`).
        label: Box<str>,
    },
    /// A named step ended.
    StepFinished {
        /// Status line of the step.
        label: Box<str>,
        /// Whether the step succeeded.
        ok: bool,
    },
    /// Extra detail produced by the running step.
    Detail {
        /// Detail text (e.g. `Container ID: 3f2a9c`).
        message: Box<str>,
    },
}

/// Callback receiving progress events.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

pub(crate) struct Progress {
    sink: Option<ProgressSink>,
}

impl Progress {
    pub(crate) const fn new(sink: Option<ProgressSink>) -> Self {
        Self { sink }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = self.sink.as_ref() {
            sink(event);
        }
    }

    pub(crate) fn detail(&self, message: impl Into<Box<str>>) {
        self.emit(ProgressEvent::Detail {
            message: message.into(),
        });
    }

    /// Run `body` as a named step, reporting start and outcome.
    pub(crate) fn step<T>(&self, label: &str, body: impl FnOnce() -> Result<T>) -> Result<T> {
        self.emit(ProgressEvent::StepStarted {
            label: label.into(),
        });
        let result = body();
        self.emit(ProgressEvent::StepFinished {
            label: label.into(),
            ok: result.is_ok(),
        });
        result
    }
}
