//! Master-list lookup and the confirmation-message helper.

use crate::confirmation::confirmation_message;
use crate::error::AppError;
use crate::extractors::ApiQuery;
use crate::handlers::guests::NameQuery;
use crate::response::{success_one_ok, MessageBody};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct MessageQuery {
    pub name: String,
    pub passes: i32,
}

/// Always 200 with the lookup outcome (found / not_found / failed) as data.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.repo.find_master_guest(&query.name).await?))
}

pub async fn message(ApiQuery(query): ApiQuery<MessageQuery>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(MessageBody {
        message: confirmation_message(&query.name, query.passes),
    }))
}
