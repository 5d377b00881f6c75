//! Progress lines buffered for stderr.

use std::sync::{Arc, Mutex, PoisonError};
use svcplus_app::{ProgressEvent, ProgressSink};

/// Collects step lines emitted by a use case.
#[derive(Clone, Default)]
pub struct ProgressLog {
    lines: Arc<Mutex<String>>,
    enabled: bool,
}

impl ProgressLog {
    /// Log that records lines only when `enabled`.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            lines: Arc::default(),
            enabled,
        }
    }

    /// Sink handed to the use case; `None` when progress is suppressed.
    #[must_use]
    pub fn sink(&self) -> Option<ProgressSink> {
        if !self.enabled {
            return None;
        }
        let lines = Arc::clone(&self.lines);
        Some(Arc::new(move |event: ProgressEvent| {
            let mut buffer = lines.lock().unwrap_or_else(PoisonError::into_inner);
            buffer.push_str(&render_event(&event));
            buffer.push('\n');
        }))
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn render_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::StepStarted { label } => format!("{label} ..."),
        ProgressEvent::StepFinished { ok: true, .. } => "  Done".to_owned(),
        ProgressEvent::StepFinished { ok: false, .. } => "  FAILED".to_owned(),
        ProgressEvent::Detail { message } => format!("  {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(log: &ProgressLog, events: Vec<ProgressEvent>) {
        if let Some(sink) = log.sink() {
            for event in events {
                sink(event);
            }
        }
    }

    #[test]
    fn steps_render_as_status_lines() {
        let log = ProgressLog::new(true);
        emit(
            &log,
            vec![
                ProgressEvent::StepStarted {
                    label: "Starting prometheus".into(),
                },
                ProgressEvent::Detail {
                    message: "Container ID: 3f2a9c".into(),
                },
                ProgressEvent::StepFinished {
                    label: "Starting prometheus".into(),
                    ok: true,
                },
                ProgressEvent::StepStarted {
                    label: "Starting grafana".into(),
                },
                ProgressEvent::StepFinished {
                    label: "Starting grafana".into(),
                    ok: false,
                },
            ],
        );
        assert_eq!(
            log.take(),
            "Starting prometheus ...\n  Container ID: 3f2a9c\n  Done\nStarting grafana ...\n  FAILED\n"
        );
        assert!(log.take().is_empty());
    }

    #[test]
    fn disabled_log_hands_out_no_sink() {
        let log = ProgressLog::new(false);
        assert!(log.sink().is_none());
        assert!(log.take().is_empty());
    }
}
