//! Document (invoice or quotation) model for garage-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{
    empty_string_as_none, Client, JobDetail, JobInput, LineItemDetail, LineItemInput, Vehicle,
};

/// Which back-office flow owns the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Invoicing,
    Quotation,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Invoicing => "invoicing",
            SourceType::Quotation => "quotation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invoicing" => Some(SourceType::Invoicing),
            "quotation" => Some(SourceType::Quotation),
            _ => None,
        }
    }

    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or(SourceType::Quotation)
    }
}

/// Payment status of an invoicing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Unpaid,
    Paid,
    Cancelled,
    Voided,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 4] = [
        DocumentStatus::Unpaid,
        DocumentStatus::Paid,
        DocumentStatus::Cancelled,
        DocumentStatus::Voided,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Unpaid => "unpaid",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Cancelled => "cancelled",
            DocumentStatus::Voided => "voided",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or(DocumentStatus::Unpaid)
    }

    /// True when a document moves into `paid` from any other (or no) status.
    /// This is the only transition with a stock side effect.
    pub fn enters_paid(previous: Option<DocumentStatus>, next: DocumentStatus) -> bool {
        next == DocumentStatus::Paid && previous != Some(DocumentStatus::Paid)
    }
}

/// Workshop progress on the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Done,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 3] = [
        ServiceStatus::Pending,
        ServiceStatus::InProgress,
        ServiceStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or(ServiceStatus::Pending)
    }
}

/// Stored document header.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: Uuid,
    pub client_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub vehicle_name: Option<String>,
    pub source_type: String,
    pub status: String,
    pub service_status: String,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub vat_amount: Decimal,
    pub grand_total: Decimal,
    pub payment_type: String,
    pub invoice_no: Option<String>,
    pub number: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Document {
    pub fn source_type(&self) -> SourceType {
        SourceType::from_string(&self.source_type)
    }

    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::from_string(&self.status)
    }

    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus::from_string(&self.service_status)
    }
}

/// A submitted value that could not be read as its field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    /// Form field reported on (`items` and `jobs` for nested values).
    pub field: &'static str,
    pub rule: &'static str,
    pub message: String,
}

/// Document form as submitted by the cashier screens.
///
/// Every field is optional at this level; the rules for each source type
/// live in `services::validation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPayload {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub client_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub vehicle_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub vehicle_name: Option<String>,
    pub plate: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub color: Option<String>,
    pub odometer: Option<String>,
    pub subtotal: Option<Decimal>,
    pub total_discount: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub grand_total: Option<Decimal>,
    pub payment_type: Option<String>,
    pub status: Option<String>,
    pub service_status: Option<String>,
    pub invoice_no: Option<String>,
    pub number: Option<String>,
    pub address: Option<String>,
    /// Backdating override for `created_at` (`YYYY-MM-DD` or RFC 3339).
    pub created_date: Option<String>,
    pub items: Option<Vec<LineItemInput>>,
    pub jobs: Option<Vec<JobInput>>,
    /// Values dropped while decoding the body; reported as violations.
    #[serde(skip)]
    pub malformed: Vec<MalformedField>,
}

impl DocumentPayload {
    /// A quick "mark as paid" style edit: a status, optionally a service
    /// status, and nothing else from the full form.
    pub fn is_status_only(&self) -> bool {
        self.status.is_some() && self.malformed.is_empty() && !self.has_form_fields()
    }

    fn has_form_fields(&self) -> bool {
        let text = [
            &self.customer_name,
            &self.vehicle_name,
            &self.plate,
            &self.model,
            &self.year,
            &self.color,
            &self.odometer,
            &self.payment_type,
            &self.invoice_no,
            &self.number,
            &self.address,
            &self.created_date,
        ];
        let amounts = [
            &self.subtotal,
            &self.total_discount,
            &self.vat_amount,
            &self.grand_total,
        ];
        text.iter().any(|field| field.is_some())
            || amounts.iter().any(|field| field.is_some())
            || self.client_id.is_some()
            || self.vehicle_id.is_some()
            || self.items.is_some()
            || self.jobs.is_some()
    }

    /// True when decoding already reported `field`.
    pub fn is_malformed(&self, field: &str) -> bool {
        self.malformed.iter().any(|m| m.field == field)
    }
}

/// Header values written to storage on create or full update.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub client_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub vehicle_name: Option<String>,
    pub source_type: SourceType,
    pub status: DocumentStatus,
    pub service_status: ServiceStatus,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub vat_amount: Decimal,
    pub grand_total: Decimal,
    pub payment_type: String,
    pub invoice_no: Option<String>,
    pub number: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Document with its parties, items and jobs expanded.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub client: Option<Client>,
    pub vehicle: Option<Vehicle>,
    pub items: Vec<LineItemDetail>,
    pub jobs: Vec<JobDetail>,
}

/// Row of a document listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DocumentSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub document: Document,
    pub client_name: Option<String>,
    pub plate_number: Option<String>,
}

/// Filter parameters for listing documents.
#[derive(Debug, Clone)]
pub struct ListDocumentsFilter {
    pub source_type: Option<SourceType>,
    pub search: Option<String>,
    pub page: i64,
    pub per_page: i64,
}

impl ListDocumentsFilter {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

/// One page of results plus what a paginator needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub last_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let last_page = if per_page > 0 {
            ((total + per_page - 1) / per_page).max(1)
        } else {
            1
        };
        Self {
            items,
            total,
            page: page.max(1),
            per_page,
            last_page,
        }
    }
}
