use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use tallyflow_application::{ApplyTransitionInput, PendingRecordsQuery, PostToLedgerInput};
use tallyflow_core::{ActorContext, AppError, AppResult};
use tallyflow_domain::{RecordKind, RecordState, TransitionAction};

use crate::dto::{
    ApplyTransitionRequest, CanActResponse, ConfirmDeliveryRequest, PendingRecordsResponse,
    PostToLedgerRequest, RejectPostingRequest, SubmitRecordRequest, TransitionEntryResponse,
    TransitionOutcomeResponse, WorkflowRecordResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod posting;
mod queries;
mod submission;
mod transitions;


pub use posting::{confirm_delivery_handler, post_to_ledger_handler, reject_posting_handler};
pub use queries::{
    can_act_handler, get_record_handler, list_pending_handler, record_history_handler,
};
pub use submission::{mark_fulfillment_executed_handler, submit_record_handler};
pub use transitions::apply_transition_handler;
