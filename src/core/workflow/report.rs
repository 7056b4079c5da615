use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::core::step::StepResult;

/// Progress of one workflow invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "lowercase")]
pub enum WorkflowState {
    Idle,
    /// Executing the step with this index.
    Running(usize),
    Succeeded,
    /// Stopped at the step with this index.
    Failed(usize),
}

/// Result handed back to the caller: a verdict and the transcript to show.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub success: bool,
    pub log: Vec<String>,
    pub state: WorkflowState,
    /// Label of the step that failed, if any.
    pub failed_step: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WorkflowReport {
    /// A run refused by its guard before any step executed.
    pub fn rejected() -> Self {
        let now = Utc::now();
        Self {
            success: false,
            log: Vec::new(),
            state: WorkflowState::Idle,
            failed_step: None,
            started_at: now,
            finished_at: now,
        }
    }
}

/// Accumulates the transcript of a running pipeline.
pub(crate) struct Run {
    state: WorkflowState,
    next_step: usize,
    log: Vec<String>,
    failed_step: Option<String>,
    started_at: DateTime<Utc>,
}

impl Run {
    pub(crate) fn start() -> Self {
        Self {
            state: WorkflowState::Idle,
            next_step: 0,
            log: Vec::new(),
            failed_step: None,
            started_at: Utc::now(),
        }
    }

    /// Mark the next step as running.
    pub(crate) fn begin(&mut self) {
        self.state = WorkflowState::Running(self.next_step);
    }

    /// Append a finished step's log. Returns `false` if the step failed.
    pub(crate) fn record(&mut self, label: &str, result: StepResult) -> bool {
        let index = self.next_step;
        self.next_step += 1;
        match result {
            Ok(lines) => {
                self.log.extend(lines);
                true
            }
            Err(failure) => {
                warn!("Step '{}' failed: {}", label, failure.error);
                self.log.extend(failure.log);
                self.state = WorkflowState::Failed(index);
                self.failed_step = Some(label.to_string());
                false
            }
        }
    }

    pub(crate) fn finish(mut self) -> WorkflowReport {
        if !matches!(self.state, WorkflowState::Failed(_)) {
            self.state = WorkflowState::Succeeded;
        }
        WorkflowReport {
            success: self.state == WorkflowState::Succeeded,
            log: self.log,
            state: self.state,
            failed_step: self.failed_step,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ManagerError;
    use crate::core::step::StepFailure;

    #[test]
    fn failure_keeps_transcript_and_index() {
        let mut run = Run::start();
        run.begin();
        assert!(run.record("first", Ok(vec!["one".into()])));
        run.begin();
        assert!(!run.record(
            "second",
            Err(StepFailure::new(
                vec!["two".into()],
                ManagerError::Other("boom".into())
            ))
        ));

        let report = run.finish();
        assert!(!report.success);
        assert_eq!(report.state, WorkflowState::Failed(1));
        assert_eq!(report.failed_step.as_deref(), Some("second"));
        assert_eq!(report.log, ["one", "two", "Error: boom"]);
    }
}
