use super::*;

/// Query string accepted by the pending-work listing.
#[derive(Debug, Default, Deserialize)]
pub struct PendingRecordsParams {
    pub kind: Option<String>,
    pub state: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

impl PendingRecordsParams {
    fn into_query(self) -> AppResult<PendingRecordsQuery> {
        Ok(PendingRecordsQuery {
            kind: self.kind.as_deref().map(str::parse::<RecordKind>).transpose()?,
            state: self
                .state
                .as_deref()
                .map(str::parse::<RecordState>)
                .transpose()?,
            created_from: self.created_from.as_deref().map(parse_timestamp).transpose()?,
            created_to: self.created_to.as_deref().map(parse_timestamp).transpose()?,
            cursor: self.cursor,
            limit: self.limit,
        })
    }
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid timestamp '{value}': {error}")))
}

#[derive(Debug, Deserialize)]
pub struct CanActQuery {
    pub action: String,
}

pub async fn get_record_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<WorkflowRecordResponse>> {
    let record = state
        .workflow_service
        .find_record(&actor, record_id.as_str())
        .await?;

    Ok(Json(WorkflowRecordResponse::from(record)))
}

pub async fn record_history_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<Vec<TransitionEntryResponse>>> {
    let entries = state
        .workflow_service
        .get_history(&actor, record_id.as_str())
        .await?
        .into_iter()
        .map(TransitionEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn list_pending_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Query(params): Query<PendingRecordsParams>,
) -> ApiResult<Json<PendingRecordsResponse>> {
    let page = state
        .workflow_service
        .list_pending(&actor, params.into_query()?)
        .await?;

    Ok(Json(PendingRecordsResponse {
        records: page
            .records
            .into_iter()
            .map(WorkflowRecordResponse::from)
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn can_act_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
    Query(query): Query<CanActQuery>,
) -> ApiResult<Json<CanActResponse>> {
    let action = query.action.parse::<TransitionAction>()?;
    let allowed = state
        .workflow_service
        .can_act(&actor, record_id.as_str(), action)
        .await?;

    Ok(Json(CanActResponse {
        action: action.as_str().to_owned(),
        allowed,
    }))
}
