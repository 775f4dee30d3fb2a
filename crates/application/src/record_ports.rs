mod inputs;
mod queries;
mod repository;

pub use inputs::{
    ApplyTransitionInput, PendingRecordsPage, PendingRecordsQuery, SubmitRecordInput,
    TransitionOutcome,
};
pub use queries::{RecordCursor, RecordListQuery, StateDistributionRow};
pub use repository::WorkflowRecordRepository;
