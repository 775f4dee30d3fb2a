use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tallyflow_core::AppError;
use tracing::error;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::UnknownPrincipal(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_)
            | AppError::StaleState(_)
            | AppError::AlreadyPosted(_)
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            AppError::InvalidTransition(_) => {
                "this item was already acted on, please refresh".to_owned()
            }
            AppError::Internal(_) => "internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse {
            code: self.0.code().to_owned(),
            message: self.message(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tallyflow_core::AppError;

    use super::ApiError;

    #[test]
    fn workflow_conflicts_map_to_409_with_distinct_codes() {
        for (error, code) in [
            (
                AppError::InvalidTransition("approve from paid".to_owned()),
                "invalid_transition",
            ),
            (AppError::StaleState("version 3".to_owned()), "stale_state"),
            (AppError::AlreadyPosted("5100".to_owned()), "already_posted"),
        ] {
            assert_eq!(error.code(), code);
            assert_eq!(ApiError(error).status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn invalid_transition_message_asks_for_refresh() {
        let error = ApiError(AppError::InvalidTransition(
            "approve is not legal from paid".to_owned(),
        ));
        assert_eq!(
            error.message(),
            "this item was already acted on, please refresh"
        );
    }

    #[test]
    fn unauthorized_exposes_resource_only() {
        let error = ApiError(AppError::Unauthorized("purchase_order".to_owned()));
        assert_eq!(error.status(), StatusCode::FORBIDDEN);
        assert_eq!(error.message(), "access restricted: purchase_order");
    }

    #[test]
    fn identity_failures_have_their_own_statuses() {
        assert_eq!(
            ApiError(AppError::Unauthenticated("missing header".to_owned())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AppError::UnknownPrincipal("ghost".to_owned())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_detail_is_not_returned() {
        let error = ApiError(AppError::Internal("connection refused".to_owned()));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "internal server error");
    }
}
