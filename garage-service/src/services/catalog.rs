//! Reference data: parts, technicians, and single client/vehicle lookups.

use crate::models::{Client, NewPart, NewTechnician, Part, Technician, Vehicle};
use crate::services::store::{ClientRepo, InventoryRepo, Store, TechnicianRepo, VehicleRepo};
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[instrument(skip(store))]
pub async fn list_parts(store: &dyn Store) -> Result<Vec<Part>, AppError> {
    let mut uow = store.begin().await?;
    let parts = uow.list_parts().await?;
    uow.commit().await?;
    Ok(parts)
}

#[instrument(skip(store))]
pub async fn get_part(store: &dyn Store, part_id: Uuid) -> Result<Part, AppError> {
    let mut uow = store.begin().await?;
    let part = uow.get_part(part_id).await?;
    uow.commit().await?;
    part.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Part {} not found", part_id)))
}

#[instrument(skip(store, input), fields(item_name = %input.item_name))]
pub async fn create_part(store: &dyn Store, input: NewPart) -> Result<Part, AppError> {
    input.validate()?;

    let mut uow = store.begin().await?;
    let part = uow.insert_part(&input).await?;
    uow.commit().await?;

    info!(part_id = %part.part_id, quantity = part.quantity, "Part added");
    Ok(part)
}

#[instrument(skip(store))]
pub async fn list_technicians(store: &dyn Store) -> Result<Vec<Technician>, AppError> {
    let mut uow = store.begin().await?;
    let technicians = uow.list_technicians().await?;
    uow.commit().await?;
    Ok(technicians)
}

#[instrument(skip(store, input), fields(name = %input.name))]
pub async fn create_technician(
    store: &dyn Store,
    input: NewTechnician,
) -> Result<Technician, AppError> {
    input.validate()?;

    let mut uow = store.begin().await?;
    let technician = uow.insert_technician(&input).await?;
    uow.commit().await?;

    info!(technician_id = %technician.technician_id, "Technician registered");
    Ok(technician)
}

#[instrument(skip(store))]
pub async fn get_client(store: &dyn Store, client_id: Uuid) -> Result<Client, AppError> {
    let mut uow = store.begin().await?;
    let client = uow.get_client(client_id).await?;
    uow.commit().await?;
    client.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client {} not found", client_id)))
}

#[instrument(skip(store))]
pub async fn get_vehicle(store: &dyn Store, vehicle_id: Uuid) -> Result<Vehicle, AppError> {
    let mut uow = store.begin().await?;
    let vehicle = uow.get_vehicle(vehicle_id).await?;
    uow.commit().await?;
    vehicle.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Vehicle {} not found", vehicle_id)))
}
