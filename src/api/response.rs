use serde::{Deserialize, Serialize};
use axum::Json;
use axum::http::StatusCode;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn error(status: StatusCode, detail: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { detail: detail.into() }))
}
