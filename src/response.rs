//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

/// Row count, used as list meta and as the body of count-only endpoints.
#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Text handed back to the guest after a confirmation.
#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::CREATED,
        Json(SuccessOne {
            data,
            meta: None,
        }),
    )
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            data,
            meta: None,
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

/// Count-only answer: `{ "data": { "count": n } }`.
pub fn success_count(count: u64) -> (StatusCode, Json<SuccessOne<MetaCount>>) {
    success_one_ok(MetaCount { count })
}

/// Deletes answer with an empty 204, also when the row was already gone.
pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
