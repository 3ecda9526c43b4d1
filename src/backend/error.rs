use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::database::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Store failures mapped onto HTTP responses: validation → 400,
/// not-found → 404, conflicts → 409, everything else → 500 with the
/// detail kept out of the body.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use StoreError::*;
        let status = match &self.0 {
            InvalidAmount | InvalidDescription | InvalidCategoryName | UnknownCategory(_) => {
                StatusCode::BAD_REQUEST
            }
            TransactionNotFound(_) | CategoryNotFound(_) => StatusCode::NOT_FOUND,
            DuplicateCategory(_) | CategoryInUse(_) => StatusCode::CONFLICT,
            Db(e) => {
                error!(error = %e, "store failure");
                let body = ErrorBody { error: "internal error".to_string() };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
