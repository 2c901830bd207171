//! In-process storage backend.
//!
//! A unit of work holds the store lock for its whole lifetime and edits a
//! copy of the tables; commit swaps the copy in, drop throws it away.

use crate::models::{
    Client, Document, DocumentRecord, DocumentStatus, DocumentSummary, Job, LineItem,
    ListDocumentsFilter, NewClient, NewJob, NewLineItem, NewPart, NewTechnician, Part,
    ServiceStatus, SourceType, Technician, Vehicle, VehicleFields,
};
use crate::services::store::{
    ClientRepo, DocumentRepo, InventoryRepo, Store, TechnicianRepo, UnitOfWork, VehicleRepo,
};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct Tables {
    clients: HashMap<Uuid, Client>,
    vehicles: HashMap<Uuid, Vehicle>,
    technicians: HashMap<Uuid, Technician>,
    parts: HashMap<Uuid, Part>,
    documents: HashMap<Uuid, Document>,
    line_items: Vec<LineItem>,
    jobs: Vec<Job>,
}

impl Tables {
    fn check_invoice_no(&self, record: &DocumentRecord, exclude: Option<Uuid>) -> Result<(), AppError> {
        if record.source_type != SourceType::Invoicing {
            return Ok(());
        }
        let Some(invoice_no) = record.invoice_no.as_deref() else {
            return Ok(());
        };
        if invoice_no_used(&self.documents, invoice_no, exclude) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                invoice_no
            )));
        }
        Ok(())
    }
}

fn invoice_no_used(documents: &HashMap<Uuid, Document>, invoice_no: &str, exclude: Option<Uuid>) -> bool {
    documents.values().any(|doc| {
        Some(doc.document_id) != exclude
            && doc.source_type == SourceType::Invoicing.as_str()
            && doc.invoice_no.as_deref() == Some(invoice_no)
    })
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(needle))
}

fn page<T>(rows: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

fn not_found(entity: &str, id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!("{} {} not found", entity, id))
}

/// Storage kept in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Unit of work over [`MemoryStore`].
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl ClientRepo for MemoryUnitOfWork {
    async fn get_client(&mut self, client_id: Uuid) -> Result<Option<Client>, AppError> {
        Ok(self.working.clients.get(&client_id).cloned())
    }

    async fn insert_client(&mut self, input: &NewClient) -> Result<Client, AppError> {
        let client = Client {
            client_id: Uuid::new_v4(),
            name: input.name.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            email: input.email.clone(),
            created_utc: Utc::now(),
        };
        self.working.clients.insert(client.client_id, client.clone());
        Ok(client)
    }

    async fn update_client_contact(
        &mut self,
        client_id: Uuid,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), AppError> {
        let client = self
            .working
            .clients
            .get_mut(&client_id)
            .ok_or_else(|| not_found("Client", client_id))?;
        client.phone = phone.map(str::to_string);
        client.address = address.map(str::to_string);
        Ok(())
    }

    async fn search_clients(
        &mut self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Client>, i64), AppError> {
        let needle = query.to_lowercase();
        let mut matches: Vec<Client> = self
            .working
            .clients
            .values()
            .filter(|client| contains_ci(Some(&client.name), &needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.client_id.cmp(&b.client_id)));
        let total = matches.len() as i64;
        Ok((page(matches, offset, limit), total))
    }
}

#[async_trait]
impl VehicleRepo for MemoryUnitOfWork {
    async fn get_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, AppError> {
        Ok(self.working.vehicles.get(&vehicle_id).cloned())
    }

    async fn insert_vehicle(
        &mut self,
        client_id: Option<Uuid>,
        fields: &VehicleFields,
    ) -> Result<Vehicle, AppError> {
        let vehicle = Vehicle {
            vehicle_id: Uuid::new_v4(),
            client_id,
            plate_number: fields.plate_number.clone(),
            model: fields.model.clone(),
            year: fields.year.clone(),
            color: fields.color.clone(),
            odometer: fields.odometer.clone(),
            created_utc: Utc::now(),
        };
        self.working.vehicles.insert(vehicle.vehicle_id, vehicle.clone());
        Ok(vehicle)
    }

    async fn update_vehicle_details(
        &mut self,
        vehicle_id: Uuid,
        fields: &VehicleFields,
    ) -> Result<(), AppError> {
        let vehicle = self
            .working
            .vehicles
            .get_mut(&vehicle_id)
            .ok_or_else(|| not_found("Vehicle", vehicle_id))?;
        vehicle.plate_number = fields.plate_number.clone();
        vehicle.model = fields.model.clone();
        vehicle.year = fields.year.clone();
        vehicle.color = fields.color.clone();
        vehicle.odometer = fields.odometer.clone();
        Ok(())
    }

    async fn search_vehicles(
        &mut self,
        query: &str,
        client_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Vehicle>, AppError> {
        let needle = query.to_lowercase();
        let mut matches: Vec<Vehicle> = self
            .working
            .vehicles
            .values()
            .filter(|vehicle| contains_ci(vehicle.plate_number.as_deref(), &needle))
            .filter(|vehicle| client_id.is_none() || vehicle.client_id == client_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.plate_number
                .cmp(&b.plate_number)
                .then(a.vehicle_id.cmp(&b.vehicle_id))
        });
        Ok(page(matches, 0, limit))
    }
}

#[async_trait]
impl TechnicianRepo for MemoryUnitOfWork {
    async fn get_technician(
        &mut self,
        technician_id: Uuid,
    ) -> Result<Option<Technician>, AppError> {
        Ok(self.working.technicians.get(&technician_id).cloned())
    }

    async fn list_technicians(&mut self) -> Result<Vec<Technician>, AppError> {
        let mut technicians: Vec<Technician> =
            self.working.technicians.values().cloned().collect();
        technicians.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(technicians)
    }

    async fn insert_technician(&mut self, input: &NewTechnician) -> Result<Technician, AppError> {
        let technician = Technician {
            technician_id: Uuid::new_v4(),
            name: input.name.clone(),
            position: input.position.clone(),
            created_utc: Utc::now(),
        };
        self.working
            .technicians
            .insert(technician.technician_id, technician.clone());
        Ok(technician)
    }
}

#[async_trait]
impl InventoryRepo for MemoryUnitOfWork {
    async fn get_part(&mut self, part_id: Uuid) -> Result<Option<Part>, AppError> {
        Ok(self.working.parts.get(&part_id).cloned())
    }

    async fn list_parts(&mut self) -> Result<Vec<Part>, AppError> {
        let mut parts: Vec<Part> = self.working.parts.values().cloned().collect();
        parts.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        Ok(parts)
    }

    async fn insert_part(&mut self, input: &NewPart) -> Result<Part, AppError> {
        let part = Part {
            part_id: Uuid::new_v4(),
            item_name: input.item_name.clone(),
            part_number: input.part_number.clone(),
            quantity: input.quantity,
            selling_price: input.selling_price,
            acquisition_price: input.acquisition_price,
            created_utc: Utc::now(),
        };
        self.working.parts.insert(part.part_id, part.clone());
        Ok(part)
    }

    async fn deduct_quantity(
        &mut self,
        part_id: Uuid,
        amount: i32,
    ) -> Result<Option<i32>, AppError> {
        Ok(self.working.parts.get_mut(&part_id).map(|part| {
            part.quantity -= amount;
            part.quantity
        }))
    }
}

#[async_trait]
impl DocumentRepo for MemoryUnitOfWork {
    async fn insert_document(&mut self, record: &DocumentRecord) -> Result<Document, AppError> {
        self.working.check_invoice_no(record, None)?;
        let document = Document {
            document_id: Uuid::new_v4(),
            client_id: record.client_id,
            vehicle_id: record.vehicle_id,
            customer_name: record.customer_name.clone(),
            vehicle_name: record.vehicle_name.clone(),
            source_type: record.source_type.as_str().to_string(),
            status: record.status.as_str().to_string(),
            service_status: record.service_status.as_str().to_string(),
            subtotal: record.subtotal,
            total_discount: record.total_discount,
            vat_amount: record.vat_amount,
            grand_total: record.grand_total,
            payment_type: record.payment_type.clone(),
            invoice_no: record.invoice_no.clone(),
            number: record.number.clone(),
            address: record.address.clone(),
            created_at: record.created_at,
            updated_utc: Utc::now(),
        };
        self.working
            .documents
            .insert(document.document_id, document.clone());
        Ok(document)
    }

    async fn get_document(&mut self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.working.documents.get(&document_id).cloned())
    }

    async fn lock_document(&mut self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        // The unit of work already holds the whole store.
        self.get_document(document_id).await
    }

    async fn update_document(
        &mut self,
        document_id: Uuid,
        record: &DocumentRecord,
    ) -> Result<Document, AppError> {
        self.working.check_invoice_no(record, Some(document_id))?;
        let document = self
            .working
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| not_found("Document", document_id))?;
        document.client_id = record.client_id;
        document.vehicle_id = record.vehicle_id;
        document.customer_name = record.customer_name.clone();
        document.vehicle_name = record.vehicle_name.clone();
        document.source_type = record.source_type.as_str().to_string();
        document.status = record.status.as_str().to_string();
        document.service_status = record.service_status.as_str().to_string();
        document.subtotal = record.subtotal;
        document.total_discount = record.total_discount;
        document.vat_amount = record.vat_amount;
        document.grand_total = record.grand_total;
        document.payment_type = record.payment_type.clone();
        document.invoice_no = record.invoice_no.clone();
        document.number = record.number.clone();
        document.address = record.address.clone();
        document.created_at = record.created_at;
        document.updated_utc = Utc::now();
        Ok(document.clone())
    }

    async fn update_document_status(
        &mut self,
        document_id: Uuid,
        status: DocumentStatus,
        service_status: ServiceStatus,
    ) -> Result<Document, AppError> {
        let document = self
            .working
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| not_found("Document", document_id))?;
        document.status = status.as_str().to_string();
        document.service_status = service_status.as_str().to_string();
        document.updated_utc = Utc::now();
        Ok(document.clone())
    }

    async fn update_document_source_type(
        &mut self,
        document_id: Uuid,
        source_type: SourceType,
    ) -> Result<Document, AppError> {
        let clash = {
            let document = self
                .working
                .documents
                .get(&document_id)
                .ok_or_else(|| not_found("Document", document_id))?;
            source_type == SourceType::Invoicing
                && document.invoice_no.as_deref().is_some_and(|invoice_no| {
                    invoice_no_used(&self.working.documents, invoice_no, Some(document_id))
                })
        };
        if clash {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number of document {} already exists",
                document_id
            )));
        }

        let document = self
            .working
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| not_found("Document", document_id))?;
        document.source_type = source_type.as_str().to_string();
        document.updated_utc = Utc::now();
        Ok(document.clone())
    }

    async fn delete_document(&mut self, document_id: Uuid) -> Result<bool, AppError> {
        Ok(self.working.documents.remove(&document_id).is_some())
    }

    async fn invoice_no_taken(
        &mut self,
        invoice_no: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        Ok(invoice_no_used(&self.working.documents, invoice_no, exclude))
    }

    async fn insert_line_item(
        &mut self,
        document_id: Uuid,
        input: &NewLineItem,
    ) -> Result<LineItem, AppError> {
        let item = LineItem {
            line_item_id: Uuid::new_v4(),
            document_id,
            part_id: input.part_id,
            manual_part_name: input.manual_part_name.clone(),
            manual_serial_number: input.manual_serial_number.clone(),
            manual_acquisition_price: input.manual_acquisition_price,
            manual_selling_price: input.manual_selling_price,
            quantity: input.quantity,
            original_price: input.original_price,
            discount_value: input.discount_value,
            discounted_price: input.discounted_price,
            line_total: input.line_total,
            sort_order: input.sort_order,
            created_utc: Utc::now(),
        };
        self.working.line_items.push(item.clone());
        Ok(item)
    }

    async fn get_line_items(&mut self, document_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let mut items: Vec<LineItem> = self
            .working
            .line_items
            .iter()
            .filter(|item| item.document_id == document_id)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.sort_order);
        Ok(items)
    }

    async fn delete_line_items(&mut self, document_id: Uuid) -> Result<u64, AppError> {
        let before = self.working.line_items.len();
        self.working
            .line_items
            .retain(|item| item.document_id != document_id);
        Ok((before - self.working.line_items.len()) as u64)
    }

    async fn insert_job(&mut self, document_id: Uuid, input: &NewJob) -> Result<Job, AppError> {
        let job = Job {
            job_id: Uuid::new_v4(),
            document_id,
            job_description: input.job_description.clone(),
            technician_id: input.technician_id,
            total: input.total,
            sort_order: input.sort_order,
            created_utc: Utc::now(),
        };
        self.working.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_jobs(&mut self, document_id: Uuid) -> Result<Vec<Job>, AppError> {
        let mut jobs: Vec<Job> = self
            .working
            .jobs
            .iter()
            .filter(|job| job.document_id == document_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.sort_order);
        Ok(jobs)
    }

    async fn delete_jobs(&mut self, document_id: Uuid) -> Result<u64, AppError> {
        let before = self.working.jobs.len();
        self.working.jobs.retain(|job| job.document_id != document_id);
        Ok((before - self.working.jobs.len()) as u64)
    }

    async fn list_documents(
        &mut self,
        filter: &ListDocumentsFilter,
    ) -> Result<(Vec<DocumentSummary>, i64), AppError> {
        let tables = &self.working;
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut rows: Vec<DocumentSummary> = tables
            .documents
            .values()
            .filter(|doc| {
                filter
                    .source_type
                    .is_none_or(|source_type| doc.source_type == source_type.as_str())
            })
            .map(|doc| DocumentSummary {
                document: doc.clone(),
                client_name: doc
                    .client_id
                    .and_then(|id| tables.clients.get(&id))
                    .map(|client| client.name.clone()),
                plate_number: doc
                    .vehicle_id
                    .and_then(|id| tables.vehicles.get(&id))
                    .and_then(|vehicle| vehicle.plate_number.clone()),
            })
            .filter(|row| match &needle {
                None => true,
                Some(needle) => {
                    contains_ci(row.client_name.as_deref(), needle)
                        || contains_ci(row.plate_number.as_deref(), needle)
                        || contains_ci(row.document.customer_name.as_deref(), needle)
                        || contains_ci(row.document.vehicle_name.as_deref(), needle)
                        || contains_ci(row.document.invoice_no.as_deref(), needle)
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.document
                .created_at
                .cmp(&a.document.created_at)
                .then(b.document.updated_utc.cmp(&a.document.updated_utc))
        });
        let total = rows.len() as i64;
        Ok((page(rows, filter.offset(), filter.per_page), total))
    }
}
