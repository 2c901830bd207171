//! PostgreSQL storage for garage-service.

use crate::models::{
    Client, Document, DocumentRecord, DocumentStatus, DocumentSummary, Job, LineItem,
    ListDocumentsFilter, NewClient, NewJob, NewLineItem, NewPart, NewTechnician, Part,
    ServiceStatus, SourceType, Technician, Vehicle, VehicleFields,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{
    ClientRepo, DocumentRepo, InventoryRepo, Store, TechnicianRepo, UnitOfWork, VehicleRepo,
};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "garage-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl Store for Database {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

/// One PostgreSQL transaction. Rolled back if dropped before commit.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

/// Map a hit on the invoice number index to a conflict.
fn document_write_error(context: &'static str, invoice_no: Option<String>) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                invoice_no.unwrap_or_default()
            ))
        }
        _ => AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e)),
    }
}

/// `ILIKE` pattern matching `query` as a plain substring.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(db_error("Failed to commit transaction"))
    }
}

#[async_trait]
impl ClientRepo for PgUnitOfWork {
    #[instrument(skip(self), fields(client_id = %client_id))]
    async fn get_client(&mut self, client_id: Uuid) -> Result<Option<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_client"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT client_id, name, phone, address, email, created_utc
            FROM clients
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get client"))?;

        timer.observe_duration();

        Ok(client)
    }

    #[instrument(skip(self, input))]
    async fn insert_client(&mut self, input: &NewClient) -> Result<Client, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_client"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (client_id, name, phone, address, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING client_id, name, phone, address, email, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.email)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create client"))?;

        timer.observe_duration();

        Ok(client)
    }

    #[instrument(skip(self, phone, address), fields(client_id = %client_id))]
    async fn update_client_contact(
        &mut self,
        client_id: Uuid,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_client_contact"])
            .start_timer();

        sqlx::query("UPDATE clients SET phone = $2, address = $3 WHERE client_id = $1")
            .bind(client_id)
            .bind(phone)
            .bind(address)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to update client contact"))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self))]
    async fn search_clients(
        &mut self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Client>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_clients"])
            .start_timer();

        let pattern = contains_pattern(query);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error("Failed to count clients"))?;

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT client_id, name, phone, address, email, created_utc
            FROM clients
            WHERE name ILIKE $1
            ORDER BY name, client_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to search clients"))?;

        timer.observe_duration();

        Ok((clients, total))
    }
}

#[async_trait]
impl VehicleRepo for PgUnitOfWork {
    #[instrument(skip(self), fields(vehicle_id = %vehicle_id))]
    async fn get_vehicle(&mut self, vehicle_id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_vehicle"])
            .start_timer();

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT vehicle_id, client_id, plate_number, model, year, color, odometer, created_utc
            FROM vehicles
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get vehicle"))?;

        timer.observe_duration();

        Ok(vehicle)
    }

    #[instrument(skip(self, fields))]
    async fn insert_vehicle(
        &mut self,
        client_id: Option<Uuid>,
        fields: &VehicleFields,
    ) -> Result<Vehicle, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_vehicle"])
            .start_timer();

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (vehicle_id, client_id, plate_number, model, year, color, odometer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING vehicle_id, client_id, plate_number, model, year, color, odometer, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(&fields.plate_number)
        .bind(&fields.model)
        .bind(&fields.year)
        .bind(&fields.color)
        .bind(&fields.odometer)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create vehicle"))?;

        timer.observe_duration();

        Ok(vehicle)
    }

    #[instrument(skip(self, fields), fields(vehicle_id = %vehicle_id))]
    async fn update_vehicle_details(
        &mut self,
        vehicle_id: Uuid,
        fields: &VehicleFields,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_vehicle_details"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE vehicles
            SET plate_number = $2, model = $3, year = $4, color = $5, odometer = $6
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .bind(&fields.plate_number)
        .bind(&fields.model)
        .bind(&fields.year)
        .bind(&fields.color)
        .bind(&fields.odometer)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to update vehicle"))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self))]
    async fn search_vehicles(
        &mut self,
        query: &str,
        client_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Vehicle>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_vehicles"])
            .start_timer();

        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT vehicle_id, client_id, plate_number, model, year, color, odometer, created_utc
            FROM vehicles
            WHERE plate_number ILIKE $1
              AND ($2::uuid IS NULL OR client_id = $2)
            ORDER BY plate_number, vehicle_id
            LIMIT $3
            "#,
        )
        .bind(contains_pattern(query))
        .bind(client_id)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to search vehicles"))?;

        timer.observe_duration();

        Ok(vehicles)
    }
}

#[async_trait]
impl TechnicianRepo for PgUnitOfWork {
    #[instrument(skip(self), fields(technician_id = %technician_id))]
    async fn get_technician(
        &mut self,
        technician_id: Uuid,
    ) -> Result<Option<Technician>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_technician"])
            .start_timer();

        let technician = sqlx::query_as::<_, Technician>(
            "SELECT technician_id, name, position, created_utc FROM technicians WHERE technician_id = $1",
        )
        .bind(technician_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get technician"))?;

        timer.observe_duration();

        Ok(technician)
    }

    #[instrument(skip(self))]
    async fn list_technicians(&mut self) -> Result<Vec<Technician>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_technicians"])
            .start_timer();

        let technicians = sqlx::query_as::<_, Technician>(
            "SELECT technician_id, name, position, created_utc FROM technicians ORDER BY name",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to list technicians"))?;

        timer.observe_duration();

        Ok(technicians)
    }

    #[instrument(skip(self, input))]
    async fn insert_technician(&mut self, input: &NewTechnician) -> Result<Technician, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_technician"])
            .start_timer();

        let technician = sqlx::query_as::<_, Technician>(
            r#"
            INSERT INTO technicians (technician_id, name, position)
            VALUES ($1, $2, $3)
            RETURNING technician_id, name, position, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.position)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create technician"))?;

        timer.observe_duration();

        Ok(technician)
    }
}

#[async_trait]
impl InventoryRepo for PgUnitOfWork {
    #[instrument(skip(self), fields(part_id = %part_id))]
    async fn get_part(&mut self, part_id: Uuid) -> Result<Option<Part>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_part"])
            .start_timer();

        let part = sqlx::query_as::<_, Part>(
            r#"
            SELECT part_id, item_name, part_number, quantity, selling_price, acquisition_price, created_utc
            FROM inventory
            WHERE part_id = $1
            "#,
        )
        .bind(part_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get part"))?;

        timer.observe_duration();

        Ok(part)
    }

    #[instrument(skip(self))]
    async fn list_parts(&mut self) -> Result<Vec<Part>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_parts"])
            .start_timer();

        let parts = sqlx::query_as::<_, Part>(
            r#"
            SELECT part_id, item_name, part_number, quantity, selling_price, acquisition_price, created_utc
            FROM inventory
            ORDER BY item_name
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to list parts"))?;

        timer.observe_duration();

        Ok(parts)
    }

    #[instrument(skip(self, input))]
    async fn insert_part(&mut self, input: &NewPart) -> Result<Part, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_part"])
            .start_timer();

        let part = sqlx::query_as::<_, Part>(
            r#"
            INSERT INTO inventory (part_id, item_name, part_number, quantity, selling_price, acquisition_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING part_id, item_name, part_number, quantity, selling_price, acquisition_price, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.item_name)
        .bind(&input.part_number)
        .bind(input.quantity)
        .bind(input.selling_price)
        .bind(input.acquisition_price)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create part"))?;

        timer.observe_duration();

        Ok(part)
    }

    #[instrument(skip(self), fields(part_id = %part_id, amount = amount))]
    async fn deduct_quantity(
        &mut self,
        part_id: Uuid,
        amount: i32,
    ) -> Result<Option<i32>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["deduct_quantity"])
            .start_timer();

        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE inventory SET quantity = quantity - $2 WHERE part_id = $1 RETURNING quantity",
        )
        .bind(part_id)
        .bind(amount)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to deduct stock"))?;

        timer.observe_duration();

        Ok(remaining)
    }
}

#[async_trait]
impl DocumentRepo for PgUnitOfWork {
    #[instrument(skip(self, record), fields(source_type = record.source_type.as_str()))]
    async fn insert_document(&mut self, record: &DocumentRecord) -> Result<Document, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.client_id)
        .bind(record.vehicle_id)
        .bind(&record.customer_name)
        .bind(&record.vehicle_name)
        .bind(record.source_type.as_str())
        .bind(record.status.as_str())
        .bind(record.service_status.as_str())
        .bind(record.subtotal)
        .bind(record.total_discount)
        .bind(record.vat_amount)
        .bind(record.grand_total)
        .bind(&record.payment_type)
        .bind(&record.invoice_no)
        .bind(&record.number)
        .bind(&record.address)
        .bind(record.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(document_write_error(
            "Failed to create document",
            record.invoice_no.clone(),
        ))?;

        timer.observe_duration();

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn get_document(&mut self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at, updated_utc
            FROM documents
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get document"))?;

        timer.observe_duration();

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn lock_document(&mut self, document_id: Uuid) -> Result<Option<Document>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["lock_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at, updated_utc
            FROM documents
            WHERE document_id = $1
            FOR UPDATE
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to lock document"))?;

        timer.observe_duration();

        Ok(document)
    }

    #[instrument(skip(self, record), fields(document_id = %document_id))]
    async fn update_document(
        &mut self,
        document_id: Uuid,
        record: &DocumentRecord,
    ) -> Result<Document, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_document"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET client_id = $2, vehicle_id = $3, customer_name = $4, vehicle_name = $5,
                source_type = $6, status = $7, service_status = $8, subtotal = $9,
                total_discount = $10, vat_amount = $11, grand_total = $12, payment_type = $13,
                invoice_no = $14, number = $15, address = $16, created_at = $17, updated_utc = NOW()
            WHERE document_id = $1
            RETURNING document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at, updated_utc
            "#,
        )
        .bind(document_id)
        .bind(record.client_id)
        .bind(record.vehicle_id)
        .bind(&record.customer_name)
        .bind(&record.vehicle_name)
        .bind(record.source_type.as_str())
        .bind(record.status.as_str())
        .bind(record.service_status.as_str())
        .bind(record.subtotal)
        .bind(record.total_discount)
        .bind(record.vat_amount)
        .bind(record.grand_total)
        .bind(&record.payment_type)
        .bind(&record.invoice_no)
        .bind(&record.number)
        .bind(&record.address)
        .bind(record.created_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(document_write_error(
            "Failed to update document",
            record.invoice_no.clone(),
        ))?;

        timer.observe_duration();

        document.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document {} not found", document_id)))
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn update_document_status(
        &mut self,
        document_id: Uuid,
        status: DocumentStatus,
        service_status: ServiceStatus,
    ) -> Result<Document, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_document_status"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET status = $2, service_status = $3, updated_utc = NOW()
            WHERE document_id = $1
            RETURNING document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at, updated_utc
            "#,
        )
        .bind(document_id)
        .bind(status.as_str())
        .bind(service_status.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to update document status"))?;

        timer.observe_duration();

        document.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document {} not found", document_id)))
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn update_document_source_type(
        &mut self,
        document_id: Uuid,
        source_type: SourceType,
    ) -> Result<Document, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_document_source_type"])
            .start_timer();

        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET source_type = $2, updated_utc = NOW()
            WHERE document_id = $1
            RETURNING document_id, client_id, vehicle_id, customer_name, vehicle_name,
                source_type, status, service_status, subtotal, total_discount, vat_amount, grand_total,
                payment_type, invoice_no, number, address, created_at, updated_utc
            "#,
        )
        .bind(document_id)
        .bind(source_type.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(document_write_error("Failed to update document source type", None))?;

        timer.observe_duration();

        document.ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document {} not found", document_id)))
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn delete_document(&mut self, document_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_document"])
            .start_timer();

        let result = sqlx::query("DELETE FROM documents WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to delete document"))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn invoice_no_taken(
        &mut self,
        invoice_no: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["invoice_no_taken"])
            .start_timer();

        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM documents
                WHERE source_type = 'invoicing'
                  AND invoice_no = $1
                  AND ($2::uuid IS NULL OR document_id <> $2)
            )
            "#,
        )
        .bind(invoice_no)
        .bind(exclude)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to check invoice number"))?;

        timer.observe_duration();

        Ok(taken)
    }

    #[instrument(skip(self, input), fields(document_id = %document_id))]
    async fn insert_line_item(
        &mut self,
        document_id: Uuid,
        input: &NewLineItem,
    ) -> Result<LineItem, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_line_item"])
            .start_timer();

        let item = sqlx::query_as::<_, LineItem>(
            r#"
            INSERT INTO line_items (line_item_id, document_id, part_id, manual_part_name,
                manual_serial_number, manual_acquisition_price, manual_selling_price, quantity,
                original_price, discount_value, discounted_price, line_total, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING line_item_id, document_id, part_id, manual_part_name, manual_serial_number,
                manual_acquisition_price, manual_selling_price, quantity, original_price,
                discount_value, discounted_price, line_total, sort_order, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(input.part_id)
        .bind(&input.manual_part_name)
        .bind(&input.manual_serial_number)
        .bind(input.manual_acquisition_price)
        .bind(input.manual_selling_price)
        .bind(input.quantity)
        .bind(input.original_price)
        .bind(input.discount_value)
        .bind(input.discounted_price)
        .bind(input.line_total)
        .bind(input.sort_order)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create line item"))?;

        timer.observe_duration();

        Ok(item)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn get_line_items(&mut self, document_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_line_items"])
            .start_timer();

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT line_item_id, document_id, part_id, manual_part_name, manual_serial_number,
                manual_acquisition_price, manual_selling_price, quantity, original_price,
                discount_value, discounted_price, line_total, sort_order, created_utc
            FROM line_items
            WHERE document_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get line items"))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn delete_line_items(&mut self, document_id: Uuid) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_line_items"])
            .start_timer();

        let result = sqlx::query("DELETE FROM line_items WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to delete line items"))?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, input), fields(document_id = %document_id))]
    async fn insert_job(&mut self, document_id: Uuid, input: &NewJob) -> Result<Job, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_job"])
            .start_timer();

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (job_id, document_id, job_description, technician_id, total, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING job_id, document_id, job_description, technician_id, total, sort_order, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(document_id)
        .bind(&input.job_description)
        .bind(input.technician_id)
        .bind(input.total)
        .bind(input.sort_order)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to create job"))?;

        timer.observe_duration();

        Ok(job)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn get_jobs(&mut self, document_id: Uuid) -> Result<Vec<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_jobs"])
            .start_timer();

        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT job_id, document_id, job_description, technician_id, total, sort_order, created_utc
            FROM jobs
            WHERE document_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to get jobs"))?;

        timer.observe_duration();

        Ok(jobs)
    }

    #[instrument(skip(self), fields(document_id = %document_id))]
    async fn delete_jobs(&mut self, document_id: Uuid) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_jobs"])
            .start_timer();

        let result = sqlx::query("DELETE FROM jobs WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to delete jobs"))?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, filter), fields(page = filter.page, per_page = filter.per_page))]
    async fn list_documents(
        &mut self,
        filter: &ListDocumentsFilter,
    ) -> Result<(Vec<DocumentSummary>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_documents"])
            .start_timer();

        let source_type = filter.source_type.map(|s| s.as_str());
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM documents d
            LEFT JOIN clients c ON c.client_id = d.client_id
            LEFT JOIN vehicles v ON v.vehicle_id = d.vehicle_id
            WHERE ($1::varchar IS NULL OR d.source_type = $1)
              AND ($2::varchar IS NULL
                   OR c.name ILIKE $2
                   OR v.plate_number ILIKE $2
                   OR d.customer_name ILIKE $2
                   OR d.vehicle_name ILIKE $2
                   OR d.invoice_no ILIKE $2)
            "#,
        )
        .bind(source_type)
        .bind(&pattern)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to count documents"))?;

        let rows = sqlx::query_as::<_, DocumentSummary>(
            r#"
            SELECT d.document_id, d.client_id, d.vehicle_id, d.customer_name, d.vehicle_name,
                d.source_type, d.status, d.service_status, d.subtotal, d.total_discount,
                d.vat_amount, d.grand_total, d.payment_type, d.invoice_no, d.number, d.address,
                d.created_at, d.updated_utc,
                c.name AS client_name, v.plate_number AS plate_number
            FROM documents d
            LEFT JOIN clients c ON c.client_id = d.client_id
            LEFT JOIN vehicles v ON v.vehicle_id = d.vehicle_id
            WHERE ($1::varchar IS NULL OR d.source_type = $1)
              AND ($2::varchar IS NULL
                   OR c.name ILIKE $2
                   OR v.plate_number ILIKE $2
                   OR d.customer_name ILIKE $2
                   OR d.vehicle_name ILIKE $2
                   OR d.invoice_no ILIKE $2)
            ORDER BY d.created_at DESC, d.updated_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(source_type)
        .bind(&pattern)
        .bind(filter.per_page)
        .bind(filter.offset())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("Failed to list documents"))?;

        timer.observe_duration();

        Ok((rows, total))
    }
}
