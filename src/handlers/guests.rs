//! RSVP handlers: one per repository operation.

use crate::error::AppError;
use crate::extractors::{ApiJson, ApiQuery};
use crate::model::{Attendance, GuestId};
use crate::response::{no_content, success_count, success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct GuestBody {
    pub name: String,
    pub attendance: Attendance,
}

#[derive(Deserialize)]
pub struct CompanionsBody {
    pub count: i32,
}

#[derive(Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

fn parse_id(id_str: &str) -> Result<GuestId, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid guest id '{}'", id_str)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.repo.get_all_guests().await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GuestBody>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state.repo.add_guest(&body.name, body.attendance).await?;
    Ok(success_one(receipt))
}

pub async fn confirmed(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.repo.get_confirmed_guests().await?))
}

pub async fn confirmed_count(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_count(state.repo.get_confirmed_count().await?))
}

pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(state.repo.attendance_summary().await?))
}

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let guest = state
        .repo
        .find_guest_by_name(&query.name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no guest named '{}'", query.name.trim())))?;
    Ok(success_one_ok(guest))
}

pub async fn read(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    Ok(success_one_ok(state.repo.get_guest(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ApiJson(body): ApiJson<GuestBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let receipt = state.repo.update_guest(id, &body.name, body.attendance).await?;
    Ok(success_one_ok(receipt))
}

pub async fn update_companions(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ApiJson(body): ApiJson<CompanionsBody>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    Ok(success_one_ok(state.repo.update_companion_count(id, body.count).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    state.repo.delete_guest(id).await?;
    Ok(no_content())
}
