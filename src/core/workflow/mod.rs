pub mod pipeline;
pub mod report;

pub use pipeline::Workflow;
pub use report::{WorkflowReport, WorkflowState};
