//! Parts stock and technician roster.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    models::{NewPart, NewTechnician, Part, Technician},
    services::catalog,
    AppState,
};

pub async fn list_parts(State(state): State<AppState>) -> Result<Json<Vec<Part>>, AppError> {
    Ok(Json(catalog::list_parts(state.store.as_ref()).await?))
}

pub async fn get_part(
    State(state): State<AppState>,
    Path(part_id): Path<Uuid>,
) -> Result<Json<Part>, AppError> {
    Ok(Json(catalog::get_part(state.store.as_ref(), part_id).await?))
}

pub async fn create_part(
    State(state): State<AppState>,
    Json(payload): Json<NewPart>,
) -> Result<(StatusCode, Json<Part>), AppError> {
    let part = catalog::create_part(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(part)))
}

pub async fn list_technicians(
    State(state): State<AppState>,
) -> Result<Json<Vec<Technician>>, AppError> {
    Ok(Json(catalog::list_technicians(state.store.as_ref()).await?))
}

pub async fn create_technician(
    State(state): State<AppState>,
    Json(payload): Json<NewTechnician>,
) -> Result<(StatusCode, Json<Technician>), AppError> {
    let technician = catalog::create_technician(state.store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(technician)))
}
