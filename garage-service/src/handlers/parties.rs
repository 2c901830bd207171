//! Client and vehicle lookups for the cashier autocomplete.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{ClientSearchQuery, VehicleSearchQuery},
    models::{Client, Vehicle},
    services::{catalog, listing},
    AppState,
};

pub async fn search_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientSearchQuery>,
) -> Result<Json<listing::ClientSearch>, AppError> {
    let results = listing::search_clients(
        state.store.as_ref(),
        &query.q,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(state.config.default_page_size),
    )
    .await?;
    Ok(Json(results))
}

pub async fn search_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleSearchQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let vehicles =
        listing::search_vehicles(state.store.as_ref(), &query.q, query.client_id).await?;
    Ok(Json(vehicles))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(catalog::get_client(state.store.as_ref(), client_id).await?))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    Ok(Json(
        catalog::get_vehicle(state.store.as_ref(), vehicle_id).await?,
    ))
}
