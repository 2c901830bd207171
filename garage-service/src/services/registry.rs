//! Party registry: resolves the client and vehicle a document points at,
//! creating them on demand from loose form input.

use crate::models::{non_blank, ClientRef, NewClient, VehicleFields};
use crate::services::store::{ClientRepo, VehicleRepo};
use service_core::error::AppError;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Resolve a [`ClientRef`] to the id stored on the document.
#[instrument(skip(repo, client))]
pub async fn resolve_client<R>(repo: &mut R, client: &ClientRef) -> Result<Option<Uuid>, AppError>
where
    R: ClientRepo + ?Sized,
{
    match client {
        ClientRef::Existing(client_id) => Ok(Some(*client_id)),
        ClientRef::NewFromName {
            name,
            phone,
            address,
        } => {
            let created = repo
                .insert_client(&NewClient {
                    name: name.clone(),
                    phone: phone.clone(),
                    address: address.clone(),
                    email: None,
                })
                .await?;
            info!(client_id = %created.client_id, "Client registered from document");
            Ok(Some(created.client_id))
        }
        ClientRef::None => Ok(None),
    }
}

/// Resolve the vehicle for a document.
///
/// A known `vehicle_id` gets every descriptive field overwritten with the
/// submitted values. An unknown or absent id creates a new vehicle owned by
/// `owner` when any field carries a value; otherwise nothing is linked.
#[instrument(skip(repo, fields))]
pub async fn resolve_vehicle<R>(
    repo: &mut R,
    vehicle_id: Option<Uuid>,
    fields: &VehicleFields,
    owner: Option<Uuid>,
) -> Result<Option<Uuid>, AppError>
where
    R: VehicleRepo + ?Sized,
{
    if let Some(vehicle_id) = vehicle_id {
        if repo.get_vehicle(vehicle_id).await?.is_some() {
            repo.update_vehicle_details(vehicle_id, fields).await?;
            return Ok(Some(vehicle_id));
        }
        debug!(%vehicle_id, "Referenced vehicle not found");
    }

    if fields.is_empty() {
        return Ok(None);
    }

    let created = repo.insert_vehicle(owner, fields).await?;
    info!(vehicle_id = %created.vehicle_id, "Vehicle registered from document");
    Ok(Some(created.vehicle_id))
}

/// Fill in a client's phone and address where they are still empty.
/// Values already on file are never overwritten.
#[instrument(skip(repo, phone, address))]
pub async fn backfill_client_contact<R>(
    repo: &mut R,
    client_id: Uuid,
    phone: &Option<String>,
    address: &Option<String>,
) -> Result<bool, AppError>
where
    R: ClientRepo + ?Sized,
{
    let Some(client) = repo.get_client(client_id).await? else {
        return Ok(false);
    };

    let new_phone = match (non_blank(&client.phone), non_blank(phone)) {
        (None, Some(value)) => Some(value),
        _ => None,
    };
    let new_address = match (non_blank(&client.address), non_blank(address)) {
        (None, Some(value)) => Some(value),
        _ => None,
    };

    if new_phone.is_none() && new_address.is_none() {
        return Ok(false);
    }

    repo.update_client_contact(
        client_id,
        new_phone.or(client.phone.as_deref()),
        new_address.or(client.address.as_deref()),
    )
    .await?;
    debug!(%client_id, "Client contact backfilled");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;
    use crate::services::store::Store;

    fn fields(plate: &str) -> VehicleFields {
        VehicleFields {
            plate_number: Some(plate.to_string()),
            model: Some("Vios".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn new_client_is_created_with_contact() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let client = ClientRef::NewFromName {
            name: "Jose Rizal".to_string(),
            phone: Some("0917".to_string()),
            address: None,
        };
        let client_id = resolve_client(&mut *uow, &client).await.unwrap().unwrap();
        let stored = uow.get_client(client_id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Jose Rizal");
        assert_eq!(stored.phone.as_deref(), Some("0917"));
    }

    #[tokio::test]
    async fn existing_and_absent_clients_create_nothing() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let existing = Uuid::new_v4();

        assert_eq!(
            resolve_client(&mut *uow, &ClientRef::Existing(existing))
                .await
                .unwrap(),
            Some(existing)
        );
        assert_eq!(resolve_client(&mut *uow, &ClientRef::None).await.unwrap(), None);
        let (clients, total) = uow.search_clients("", 0, 10).await.unwrap();
        assert!(clients.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn known_vehicle_is_overwritten_in_place() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let vehicle = uow.insert_vehicle(None, &fields("ABC 123")).await.unwrap();

        let submitted = VehicleFields {
            plate_number: Some("ABC 123".to_string()),
            odometer: Some("45000".to_string()),
            ..Default::default()
        };
        let resolved = resolve_vehicle(&mut *uow, Some(vehicle.vehicle_id), &submitted, None)
            .await
            .unwrap();
        assert_eq!(resolved, Some(vehicle.vehicle_id));

        let stored = uow.get_vehicle(vehicle.vehicle_id).await.unwrap().unwrap();
        assert_eq!(stored.odometer.as_deref(), Some("45000"));
        assert_eq!(stored.model, None);
    }

    #[tokio::test]
    async fn unknown_vehicle_id_falls_back_to_creation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let owner = Some(Uuid::new_v4());

        let created = resolve_vehicle(&mut *uow, Some(Uuid::new_v4()), &fields("XYZ 9"), owner)
            .await
            .unwrap()
            .unwrap();
        let stored = uow.get_vehicle(created).await.unwrap().unwrap();
        assert_eq!(stored.client_id, owner);

        let none = resolve_vehicle(&mut *uow, None, &VehicleFields::default(), owner)
            .await
            .unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn backfill_only_fills_gaps() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let client = uow
            .insert_client(&NewClient {
                name: "Andres".to_string(),
                phone: Some("0918".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let changed = backfill_client_contact(
            &mut *uow,
            client.client_id,
            &Some("0999".to_string()),
            &Some("Tondo".to_string()),
        )
        .await
        .unwrap();
        assert!(changed);

        let stored = uow.get_client(client.client_id).await.unwrap().unwrap();
        assert_eq!(stored.phone.as_deref(), Some("0918"));
        assert_eq!(stored.address.as_deref(), Some("Tondo"));

        let unchanged = backfill_client_contact(&mut *uow, client.client_id, &None, &None)
            .await
            .unwrap();
        assert!(!unchanged);
    }
}
