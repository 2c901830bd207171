//! Storage seams for garage-service.
//!
//! Each entity has its own repository trait. A [`UnitOfWork`] bundles them
//! behind one storage transaction: everything done through it becomes
//! visible on [`UnitOfWork::commit`] and is discarded if the handle is
//! dropped first.

use crate::models::{
    Client, Document, DocumentRecord, DocumentStatus, DocumentSummary, Job, LineItem,
    ListDocumentsFilter, NewClient, NewJob, NewLineItem, NewPart, NewTechnician, Part,
    ServiceStatus, SourceType, Technician, Vehicle, VehicleFields,
};
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

#[async_trait]
pub trait ClientRepo: Send {
    async fn get_client(&mut self, client_id: Uuid) -> Result<Option<Client>, AppError>;

    async fn insert_client(&mut self, input: &NewClient) -> Result<Client, AppError>;

    /// Overwrite phone and address with the given values.
    async fn update_client_contact(
        &mut self,
        client_id: Uuid,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), AppError>;

    /// Clients whose name contains `query`, ordered by name, with the total match count.
    async fn search_clients(
        &mut self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Client>, i64), AppError>;
}

#[async_trait]
pub trait VehicleRepo: Send {
    async fn get_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, AppError>;

    async fn insert_vehicle(
        &mut self,
        client_id: Option<Uuid>,
        fields: &VehicleFields,
    ) -> Result<Vehicle, AppError>;

    /// Overwrite every descriptive field, including clearing the blank ones.
    async fn update_vehicle_details(
        &mut self,
        vehicle_id: Uuid,
        fields: &VehicleFields,
    ) -> Result<(), AppError>;

    /// Vehicles whose plate contains `query`, optionally owned by `client_id`.
    async fn search_vehicles(
        &mut self,
        query: &str,
        client_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Vehicle>, AppError>;
}

#[async_trait]
pub trait TechnicianRepo: Send {
    async fn get_technician(&mut self, technician_id: Uuid)
        -> Result<Option<Technician>, AppError>;

    async fn list_technicians(&mut self) -> Result<Vec<Technician>, AppError>;

    async fn insert_technician(&mut self, input: &NewTechnician) -> Result<Technician, AppError>;
}

#[async_trait]
pub trait InventoryRepo: Send {
    async fn get_part(&mut self, part_id: Uuid) -> Result<Option<Part>, AppError>;

    async fn list_parts(&mut self) -> Result<Vec<Part>, AppError>;

    async fn insert_part(&mut self, input: &NewPart) -> Result<Part, AppError>;

    /// Decrement stock in a single step. Returns the remaining quantity, or
    /// `None` when the part does not exist.
    async fn deduct_quantity(&mut self, part_id: Uuid, amount: i32)
        -> Result<Option<i32>, AppError>;
}

#[async_trait]
pub trait DocumentRepo: Send {
    async fn insert_document(&mut self, record: &DocumentRecord) -> Result<Document, AppError>;

    async fn get_document(&mut self, document_id: Uuid) -> Result<Option<Document>, AppError>;

    /// Fetch the document and hold it against concurrent writers until the
    /// unit of work ends.
    async fn lock_document(&mut self, document_id: Uuid) -> Result<Option<Document>, AppError>;

    async fn update_document(
        &mut self,
        document_id: Uuid,
        record: &DocumentRecord,
    ) -> Result<Document, AppError>;

    async fn update_document_status(
        &mut self,
        document_id: Uuid,
        status: DocumentStatus,
        service_status: ServiceStatus,
    ) -> Result<Document, AppError>;

    async fn update_document_source_type(
        &mut self,
        document_id: Uuid,
        source_type: SourceType,
    ) -> Result<Document, AppError>;

    async fn delete_document(&mut self, document_id: Uuid) -> Result<bool, AppError>;

    /// True when an invoicing document other than `exclude` uses `invoice_no`.
    async fn invoice_no_taken(
        &mut self,
        invoice_no: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError>;

    async fn insert_line_item(
        &mut self,
        document_id: Uuid,
        input: &NewLineItem,
    ) -> Result<LineItem, AppError>;

    async fn get_line_items(&mut self, document_id: Uuid) -> Result<Vec<LineItem>, AppError>;

    async fn delete_line_items(&mut self, document_id: Uuid) -> Result<u64, AppError>;

    async fn insert_job(&mut self, document_id: Uuid, input: &NewJob) -> Result<Job, AppError>;

    async fn get_jobs(&mut self, document_id: Uuid) -> Result<Vec<Job>, AppError>;

    async fn delete_jobs(&mut self, document_id: Uuid) -> Result<u64, AppError>;

    /// One page of documents, newest first, with the total match count.
    async fn list_documents(
        &mut self,
        filter: &ListDocumentsFilter,
    ) -> Result<(Vec<DocumentSummary>, i64), AppError>;
}

/// Transaction handle over every repository.
#[async_trait]
pub trait UnitOfWork: ClientRepo + VehicleRepo + TechnicianRepo + InventoryRepo + DocumentRepo {
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

/// Entry point to a storage backend.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
