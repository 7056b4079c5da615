use thiserror::Error;

use crate::core::error::ManagerError;

/// Outcome of one workflow step: the lines it logged on success.
pub type StepResult = Result<Vec<String>, StepFailure>;

/// A failed step, carrying everything it logged before and at the failure.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct StepFailure {
    pub log: Vec<String>,
    #[source]
    pub error: ManagerError,
}

impl StepFailure {
    /// Close `log` with a line describing `error`.
    pub fn new(mut log: Vec<String>, error: ManagerError) -> Self {
        log.push(format!("Error: {error}"));
        Self { log, error }
    }
}
