//! Document engine: invoice and quotation create, edit and delete.
//!
//! Every operation runs in one unit of work. Items and jobs are replaced
//! wholesale on edit, and stock is deducted exactly once when an invoicing
//! document moves into `paid`. The document row is locked before its
//! previous status is read, so that check and the deduction commit or roll
//! back together.

use crate::models::{
    Document, DocumentDetail, DocumentPayload, DocumentStatus, JobDetail, LineItem, LineItemDetail,
    SourceType,
};
use crate::services::error::DocumentError;
use crate::services::inventory::deduct_for_items;
use crate::services::metrics::{DOCUMENTS_TOTAL, DOCUMENT_OPERATIONS_TOTAL, ERRORS_TOTAL};
use crate::services::registry::{backfill_client_contact, resolve_client, resolve_vehicle};
use crate::services::store::{
    ClientRepo, DocumentRepo, InventoryRepo, Store, TechnicianRepo, UnitOfWork, VehicleRepo,
};
use crate::services::validation::{
    check_header, check_lines, check_references, check_status_update, finish, DocumentLines,
};
use chrono::Utc;
use service_core::error::AppError;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// How an existing document is being edited.
#[derive(Debug, Clone)]
pub enum DocumentUpdate {
    /// Quick payment/workshop status change on an invoice.
    Status {
        status: Option<String>,
        service_status: Option<String>,
    },
    /// Whole form resubmitted.
    Full(DocumentPayload),
    /// Move a quotation between flows without touching anything else.
    SourceType(String),
}

#[derive(Clone)]
pub struct DocumentEngine {
    store: Arc<dyn Store>,
}

fn observe<T>(operation: &'static str, result: &Result<T, DocumentError>) {
    match result {
        Ok(_) => DOCUMENT_OPERATIONS_TOTAL
            .with_label_values(&[operation, "success"])
            .inc(),
        Err(err) => {
            DOCUMENT_OPERATIONS_TOTAL
                .with_label_values(&[operation, "failure"])
                .inc();
            ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
        }
    }
}

/// A unique-index hit on insert/update means another invoice took the
/// number after it was checked.
fn duplicate_on_conflict(invoice_no: Option<String>) -> impl FnOnce(AppError) -> DocumentError {
    move |err| match (err, invoice_no) {
        (AppError::Conflict(_), Some(invoice_no)) => DocumentError::DuplicateInvoiceNumber(invoice_no),
        (err, _) => DocumentError::Storage(err),
    }
}

async fn write_children<R>(
    repo: &mut R,
    document_id: Uuid,
    lines: &DocumentLines,
) -> Result<Vec<LineItem>, AppError>
where
    R: DocumentRepo + ?Sized,
{
    let mut items = Vec::with_capacity(lines.items.len());
    for item in &lines.items {
        items.push(repo.insert_line_item(document_id, item).await?);
    }
    for job in &lines.jobs {
        repo.insert_job(document_id, job).await?;
    }
    Ok(items)
}

async fn lock_existing(
    uow: &mut dyn UnitOfWork,
    document_id: Uuid,
) -> Result<Document, DocumentError> {
    uow.lock_document(document_id)
        .await?
        .ok_or(DocumentError::NotFound(document_id))
}

impl DocumentEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Create a document with its items and jobs. Returns the new id.
    #[instrument(skip(self, payload), fields(source_type = source_type.as_str()))]
    pub async fn create_document(
        &self,
        source_type: SourceType,
        payload: DocumentPayload,
    ) -> Result<Uuid, DocumentError> {
        let result = self.create(source_type, &payload).await;
        observe("create", &result);
        result
    }

    async fn create(
        &self,
        source_type: SourceType,
        payload: &DocumentPayload,
    ) -> Result<Uuid, DocumentError> {
        let mut errors = ValidationErrors::new();
        let header = check_header(payload, source_type, &mut errors);
        let lines = check_lines(payload, &mut errors);

        let mut uow = self.store.begin().await?;
        check_references(&mut *uow, payload, source_type, None, &mut errors).await?;
        let (header, lines) = finish(errors, payload, header.zip(lines))?;

        let client_id = resolve_client(&mut *uow, &header.client).await?;
        let vehicle_id = resolve_vehicle(&mut *uow, header.vehicle_id, &header.vehicle, client_id).await?;
        if source_type == SourceType::Quotation {
            if let Some(client_id) = client_id {
                backfill_client_contact(&mut *uow, client_id, &header.number, &header.address)
                    .await?;
            }
        }

        let created_at = header.created_at.unwrap_or_else(Utc::now);
        let record = header.into_record(client_id, vehicle_id, created_at);
        let document = uow
            .insert_document(&record)
            .await
            .map_err(duplicate_on_conflict(record.invoice_no.clone()))?;

        let items = write_children(&mut *uow, document.document_id, &lines).await?;

        if source_type == SourceType::Invoicing && DocumentStatus::enters_paid(None, record.status) {
            deduct_for_items(&mut *uow, &items).await?;
        }

        uow.commit().await?;

        DOCUMENTS_TOTAL
            .with_label_values(&[source_type.as_str(), record.status.as_str()])
            .inc();
        info!(
            document_id = %document.document_id,
            status = record.status.as_str(),
            items = items.len(),
            "Document created"
        );

        Ok(document.document_id)
    }

    /// Apply an edit to an existing document.
    #[instrument(skip(self, update), fields(document_id = %document_id, source_type = source_type.as_str()))]
    pub async fn update_document(
        &self,
        document_id: Uuid,
        source_type: SourceType,
        update: DocumentUpdate,
    ) -> Result<Document, DocumentError> {
        let result = match update {
            DocumentUpdate::Status {
                status,
                service_status,
            } if source_type == SourceType::Invoicing => {
                self.update_status(document_id, &status, &service_status)
                    .await
            }
            // Quotations have no status edit; hold the body to full form rules.
            DocumentUpdate::Status {
                status,
                service_status,
            } => {
                let payload = DocumentPayload {
                    status,
                    service_status,
                    ..Default::default()
                };
                self.replace(document_id, source_type, &payload).await
            }
            DocumentUpdate::Full(payload) => self.replace(document_id, source_type, &payload).await,
            DocumentUpdate::SourceType(target) => self.switch_source(document_id, &target).await,
        };
        observe("update", &result);
        result
    }

    async fn update_status(
        &self,
        document_id: Uuid,
        status: &Option<String>,
        service_status: &Option<String>,
    ) -> Result<Document, DocumentError> {
        let mut errors = ValidationErrors::new();
        let checked = check_status_update(status, service_status, &mut errors);

        let mut uow = self.store.begin().await?;
        let existing = lock_existing(&mut *uow, document_id).await?;
        if existing.source_type() != SourceType::Invoicing {
            errors.add(
                "status",
                ValidationError::new("invoicing_only").with_message(Cow::Borrowed(
                    "status can only be changed on invoicing documents",
                )),
            );
        }
        let (status, service_status) = finish(errors, &DocumentPayload::default(), checked)?;

        let previous = existing.status();
        let document = uow
            .update_document_status(
                document_id,
                status,
                service_status.unwrap_or_else(|| existing.service_status()),
            )
            .await?;

        if DocumentStatus::enters_paid(Some(previous), status) {
            let items = uow.get_line_items(document_id).await?;
            deduct_for_items(&mut *uow, &items).await?;
        }

        uow.commit().await?;

        DOCUMENTS_TOTAL
            .with_label_values(&[document.source_type.as_str(), status.as_str()])
            .inc();
        info!(
            previous = previous.as_str(),
            status = status.as_str(),
            "Document status updated"
        );

        Ok(document)
    }

    async fn replace(
        &self,
        document_id: Uuid,
        source_type: SourceType,
        payload: &DocumentPayload,
    ) -> Result<Document, DocumentError> {
        let mut errors = ValidationErrors::new();
        let header = check_header(payload, source_type, &mut errors);
        let lines = check_lines(payload, &mut errors);

        let mut uow = self.store.begin().await?;
        let existing = lock_existing(&mut *uow, document_id).await?;
        check_references(&mut *uow, payload, source_type, Some(document_id), &mut errors).await?;
        let (header, lines) = finish(errors, payload, header.zip(lines))?;

        let client_id = resolve_client(&mut *uow, &header.client).await?;
        let vehicle_id = resolve_vehicle(&mut *uow, header.vehicle_id, &header.vehicle, client_id).await?;
        if source_type == SourceType::Quotation {
            if let Some(client_id) = client_id {
                backfill_client_contact(&mut *uow, client_id, &header.number, &header.address)
                    .await?;
            }
        }

        let created_at = header.created_at.unwrap_or(existing.created_at);
        let record = header.into_record(client_id, vehicle_id, created_at);
        let document = uow
            .update_document(document_id, &record)
            .await
            .map_err(duplicate_on_conflict(record.invoice_no.clone()))?;

        uow.delete_line_items(document_id).await?;
        uow.delete_jobs(document_id).await?;
        let items = write_children(&mut *uow, document_id, &lines).await?;

        let previous = existing.status();
        if source_type == SourceType::Invoicing
            && DocumentStatus::enters_paid(Some(previous), record.status)
        {
            deduct_for_items(&mut *uow, &items).await?;
        }

        uow.commit().await?;

        DOCUMENTS_TOTAL
            .with_label_values(&[source_type.as_str(), record.status.as_str()])
            .inc();
        info!(
            previous = previous.as_str(),
            status = record.status.as_str(),
            items = items.len(),
            "Document replaced"
        );

        Ok(document)
    }

    async fn switch_source(&self, document_id: Uuid, target: &str) -> Result<Document, DocumentError> {
        let mut uow = self.store.begin().await?;
        let existing = lock_existing(&mut *uow, document_id).await?;

        let Some(target) = SourceType::parse(target.trim()) else {
            let mut errors = ValidationErrors::new();
            errors.add(
                "source_type",
                ValidationError::new("in")
                    .with_message(Cow::Borrowed("source_type must be invoicing or quotation")),
            );
            return Err(DocumentError::Validation(errors));
        };

        let document = uow
            .update_document_source_type(document_id, target)
            .await
            .map_err(duplicate_on_conflict(existing.invoice_no.clone()))?;
        uow.commit().await?;

        info!(
            from = existing.source_type.as_str(),
            to = target.as_str(),
            "Document source type switched"
        );
        Ok(document)
    }

    /// Remove a document with its items and jobs. Stock is not restored.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn delete_document(&self, document_id: Uuid) -> Result<(), DocumentError> {
        let result = self.delete(document_id).await;
        observe("delete", &result);
        result
    }

    async fn delete(&self, document_id: Uuid) -> Result<(), DocumentError> {
        let mut uow = self.store.begin().await?;
        let existing = lock_existing(&mut *uow, document_id).await?;

        let items = uow.delete_line_items(document_id).await?;
        let jobs = uow.delete_jobs(document_id).await?;
        if !uow.delete_document(document_id).await? {
            return Err(DocumentError::NotFound(document_id));
        }
        uow.commit().await?;

        if existing.status() == DocumentStatus::Paid {
            warn!("Paid document deleted, deducted stock is not restored");
        }
        info!(items, jobs, "Document deleted");
        Ok(())
    }

    /// Fetch a document with its parties, items and jobs expanded.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document(&self, document_id: Uuid) -> Result<DocumentDetail, DocumentError> {
        let mut uow = self.store.begin().await?;
        let document = uow
            .get_document(document_id)
            .await?
            .ok_or(DocumentError::NotFound(document_id))?;

        let client = match document.client_id {
            Some(client_id) => uow.get_client(client_id).await?,
            None => None,
        };
        let vehicle = match document.vehicle_id {
            Some(vehicle_id) => uow.get_vehicle(vehicle_id).await?,
            None => None,
        };

        let mut items = Vec::new();
        for item in uow.get_line_items(document_id).await? {
            let part = match item.part_id {
                Some(part_id) => uow.get_part(part_id).await?,
                None => None,
            };
            items.push(LineItemDetail { item, part });
        }

        let mut jobs = Vec::new();
        for job in uow.get_jobs(document_id).await? {
            let technician = match job.technician_id {
                Some(technician_id) => uow.get_technician(technician_id).await?,
                None => None,
            };
            jobs.push(JobDetail { job, technician });
        }

        uow.commit().await?;

        Ok(DocumentDetail {
            document,
            client,
            vehicle,
            items,
            jobs,
        })
    }
}
