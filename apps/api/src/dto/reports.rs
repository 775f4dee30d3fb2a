use serde::Serialize;
use tallyflow_application::{StateDistributionReport, StateDistributionRow};
use ts_rs::TS;

/// Count and total for one `(kind, state)` pair.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/state-distribution-row-response.ts"
)]
pub struct StateDistributionRowResponse {
    pub kind: String,
    pub state: String,
    #[ts(type = "number")]
    pub record_count: u64,
    pub total_amount: String,
}

/// Tenant-wide state distribution.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/state-distribution-response.ts"
)]
pub struct StateDistributionResponse {
    pub rows: Vec<StateDistributionRowResponse>,
    #[ts(type = "number")]
    pub total_records: u64,
    pub total_amount: String,
}

impl From<StateDistributionRow> for StateDistributionRowResponse {
    fn from(value: StateDistributionRow) -> Self {
        Self {
            kind: value.kind.as_str().to_owned(),
            state: value.state.as_str().to_owned(),
            record_count: value.record_count,
            total_amount: value.total_amount.to_string(),
        }
    }
}

impl From<StateDistributionReport> for StateDistributionResponse {
    fn from(value: StateDistributionReport) -> Self {
        Self {
            rows: value
                .rows
                .into_iter()
                .map(StateDistributionRowResponse::from)
                .collect(),
            total_records: value.total_records,
            total_amount: value.total_amount.to_string(),
        }
    }
}
