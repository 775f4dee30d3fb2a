use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tallyflow_core::{ActorContext, AppError, TenantId};

use crate::error::ApiResult;

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Resolves the caller identity forwarded by the session layer into an [`ActorContext`].
pub async fn require_actor(mut request: Request, next: Next) -> ApiResult<Response> {
    let actor = actor_from_headers(request.headers())?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn actor_from_headers(headers: &HeaderMap) -> Result<ActorContext, AppError> {
    let actor_id = header_value(headers, ACTOR_HEADER)?;
    let tenant_id = header_value(headers, TENANT_HEADER)?;
    let tenant_id = uuid::Uuid::parse_str(tenant_id)
        .map(TenantId::from_uuid)
        .map_err(|_| AppError::Unauthenticated(format!("{TENANT_HEADER} must be a UUID")))?;

    ActorContext::new(actor_id, tenant_id)
        .map_err(|_| AppError::Unauthenticated(format!("{ACTOR_HEADER} must not be blank")))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthenticated(format!("{name} header is required")))
}
