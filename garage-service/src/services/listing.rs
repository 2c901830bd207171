//! Read-side queries: document listings and party autocomplete.

use crate::models::{Client, DocumentSummary, ListDocumentsFilter, Page, Vehicle};
use crate::services::store::{ClientRepo, DocumentRepo, Store, VehicleRepo};
use serde::Serialize;
use service_core::error::AppError;
use tracing::instrument;
use uuid::Uuid;

/// Cap on vehicle autocomplete results.
pub const VEHICLE_SEARCH_LIMIT: i64 = 20;

/// Cap on any requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// One page of client autocomplete results.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSearch {
    pub results: Vec<Client>,
    /// Whether a further page exists.
    pub more: bool,
}

/// Newest documents first, optionally narrowed by source type and a
/// free-text search over client name, plate, customer and vehicle names
/// and invoice number.
#[instrument(skip(store, filter), fields(page = filter.page, per_page = filter.per_page))]
pub async fn list_documents(
    store: &dyn Store,
    mut filter: ListDocumentsFilter,
) -> Result<Page<DocumentSummary>, AppError> {
    filter.page = filter.page.max(1);
    filter.per_page = filter.per_page.clamp(1, MAX_PAGE_SIZE);

    let mut uow = store.begin().await?;
    let (rows, total) = uow.list_documents(&filter).await?;
    uow.commit().await?;

    Ok(Page::new(rows, total, filter.page, filter.per_page))
}

/// Clients whose name contains `query`, ordered by name.
#[instrument(skip(store))]
pub async fn search_clients(
    store: &dyn Store,
    query: &str,
    page: i64,
    per_page: i64,
) -> Result<ClientSearch, AppError> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, MAX_PAGE_SIZE);

    let mut uow = store.begin().await?;
    let (results, total) = uow
        .search_clients(query.trim(), (page - 1).saturating_mul(per_page), per_page)
        .await?;
    uow.commit().await?;

    Ok(ClientSearch {
        results,
        more: page.saturating_mul(per_page) < total,
    })
}

/// Vehicles whose plate contains `query`, optionally limited to one owner.
#[instrument(skip(store))]
pub async fn search_vehicles(
    store: &dyn Store,
    query: &str,
    client_id: Option<Uuid>,
) -> Result<Vec<Vehicle>, AppError> {
    let mut uow = store.begin().await?;
    let vehicles = uow
        .search_vehicles(query.trim(), client_id, VEHICLE_SEARCH_LIMIT)
        .await?;
    uow.commit().await?;
    Ok(vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewClient, VehicleFields};
    use crate::services::memory::MemoryStore;

    #[tokio::test]
    async fn client_search_reports_more_pages() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        for name in ["Ana Cruz", "Ben Cruz", "Carla Cruz", "Dan Reyes"] {
            uow.insert_client(&NewClient {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        uow.commit().await.unwrap();

        let first = search_clients(&store, "cruz", 1, 2).await.unwrap();
        let names: Vec<_> = first.results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Cruz", "Ben Cruz"]);
        assert!(first.more);

        let second = search_clients(&store, "cruz", 2, 2).await.unwrap();
        assert_eq!(second.results.len(), 1);
        assert!(!second.more);
    }

    #[tokio::test]
    async fn far_pages_are_empty() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_client(&NewClient {
            name: "Ana Cruz".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();

        let found = search_clients(&store, "", i64::MAX, 10).await.unwrap();
        assert!(found.results.is_empty());
        assert!(!found.more);

        let filter = ListDocumentsFilter {
            source_type: None,
            search: None,
            page: i64::MAX,
            per_page: i64::MAX,
        };
        let page = list_documents(&store, filter).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn client_search_treats_wildcards_literally() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        for name in ["100% Auto", "Ana Cruz"] {
            uow.insert_client(&NewClient {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        uow.commit().await.unwrap();

        let found = search_clients(&store, "%", 1, 10).await.unwrap();
        let names: Vec<_> = found.results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["100% Auto"]);
        assert!(search_clients(&store, "_", 1, 10).await.unwrap().results.is_empty());
    }

    #[tokio::test]
    async fn vehicle_search_filters_by_owner_and_caps_results() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut uow = store.begin().await.unwrap();
        for n in 0..25 {
            let fields = VehicleFields {
                plate_number: Some(format!("NCR {:03}", n)),
                ..Default::default()
            };
            let client_id = if n % 5 == 0 { Some(owner) } else { None };
            uow.insert_vehicle(client_id, &fields).await.unwrap();
        }
        uow.commit().await.unwrap();

        let all = search_vehicles(&store, "ncr", None).await.unwrap();
        assert_eq!(all.len(), VEHICLE_SEARCH_LIMIT as usize);

        let owned = search_vehicles(&store, "NCR", Some(owner)).await.unwrap();
        assert_eq!(owned.len(), 5);
        assert!(owned.iter().all(|v| v.client_id == Some(owner)));
    }
}
