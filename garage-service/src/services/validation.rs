//! Document form rules.
//!
//! Rules are collected, not short-circuited: a rejected form reports every
//! violated field/rule pair at once. Nothing is written until the whole
//! form passes.

use crate::models::{
    non_blank, ClientRef, DocumentPayload, DocumentRecord, DocumentStatus, NewJob, NewLineItem,
    ServiceStatus, SourceType, VehicleFields,
};
use crate::services::error::DocumentError;
use crate::services::pricing::{in_range, price_line_item, to_cents};
use crate::services::store::{ClientRepo, DocumentRepo, VehicleRepo};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Header of a form that passed the field rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    pub source_type: SourceType,
    pub client: ClientRef,
    pub vehicle_id: Option<Uuid>,
    pub vehicle: VehicleFields,
    pub customer_name: Option<String>,
    pub vehicle_name: Option<String>,
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
    pub created_at: Option<DateTime<Utc>>,
}

impl DocumentHeader {
    pub fn into_record(
        self,
        client_id: Option<Uuid>,
        vehicle_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> DocumentRecord {
        DocumentRecord {
            client_id,
            vehicle_id,
            customer_name: self.customer_name,
            vehicle_name: self.vehicle_name,
            source_type: self.source_type,
            status: self.status,
            service_status: self.service_status,
            subtotal: self.subtotal,
            total_discount: self.total_discount,
            vat_amount: self.vat_amount,
            grand_total: self.grand_total,
            payment_type: self.payment_type,
            invoice_no: self.invoice_no,
            number: self.number,
            address: self.address,
            created_at,
        }
    }
}

/// Priced items and normalized jobs of a form that passed the line rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLines {
    pub items: Vec<NewLineItem>,
    pub jobs: Vec<NewJob>,
}

fn violation(code: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message.into()))
}

/// Range-check an amount and round it to cents.
fn amount(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<Decimal>,
) -> Option<Decimal> {
    let value = value?;
    if !in_range(value) {
        errors.add(field, violation("range", format!("{} is out of range", field)));
        return None;
    }
    Some(to_cents(value))
}

fn required_amount(
    errors: &mut ValidationErrors,
    payload: &DocumentPayload,
    field: &'static str,
    value: Option<Decimal>,
) -> Option<Decimal> {
    if value.is_none() && !payload.is_malformed(field) {
        errors.add(field, violation("required", format!("{} is required", field)));
    }
    amount(errors, field, value)
}

fn required_text(
    errors: &mut ValidationErrors,
    payload: &DocumentPayload,
    field: &'static str,
    value: &Option<String>,
) -> Option<String> {
    match non_blank(value) {
        Some(text) => Some(text.to_string()),
        None => {
            if !payload.is_malformed(field) {
                errors.add(field, violation("required", format!("{} is required", field)));
            }
            None
        }
    }
}

fn optional_text(value: &Option<String>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

/// Parse a `created_date` override. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM` and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_created_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn check_status(errors: &mut ValidationErrors, value: &Option<String>) -> Option<DocumentStatus> {
    let Some(raw) = non_blank(value) else {
        errors.add("status", violation("required", "status is required"));
        return None;
    };
    let parsed = DocumentStatus::parse(raw);
    if parsed.is_none() {
        errors.add(
            "status",
            violation("in", "status must be one of unpaid, paid, cancelled, voided"),
        );
    }
    parsed
}

fn check_service_status(
    errors: &mut ValidationErrors,
    value: &Option<String>,
    required: bool,
) -> Option<ServiceStatus> {
    let Some(raw) = non_blank(value) else {
        if required {
            errors.add(
                "service_status",
                violation("required", "service_status is required"),
            );
        }
        return None;
    };
    let parsed = ServiceStatus::parse(raw);
    if parsed.is_none() {
        errors.add(
            "service_status",
            violation("in", "service_status must be one of pending, in_progress, done"),
        );
    }
    parsed
}

/// Apply the field rules for `source_type`. Returns the typed header only
/// when `errors` is still empty afterwards.
pub fn check_header(
    payload: &DocumentPayload,
    source_type: SourceType,
    errors: &mut ValidationErrors,
) -> Option<DocumentHeader> {
    for malformed in &payload.malformed {
        errors.add(
            malformed.field,
            violation(malformed.rule, malformed.message.clone()),
        );
    }

    let subtotal = required_amount(errors, payload, "subtotal", payload.subtotal);
    let vat_amount = required_amount(errors, payload, "vat_amount", payload.vat_amount);
    let grand_total = required_amount(errors, payload, "grand_total", payload.grand_total);
    let payment_type = required_text(errors, payload, "payment_type", &payload.payment_type);

    let total_discount = match source_type {
        SourceType::Invoicing => amount(errors, "total_discount", payload.total_discount),
        SourceType::Quotation => {
            required_amount(errors, payload, "total_discount", payload.total_discount)
        }
    };
    if total_discount.is_some_and(|discount| discount < Decimal::ZERO) {
        errors.add(
            "total_discount",
            violation("min", "total_discount must be at least 0"),
        );
    }

    let (status, service_status, invoice_no) = match source_type {
        SourceType::Invoicing => (
            if payload.is_malformed("status") {
                None
            } else {
                check_status(errors, &payload.status)
            },
            if payload.is_malformed("service_status") {
                None
            } else {
                check_service_status(errors, &payload.service_status, true)
            },
            required_text(errors, payload, "invoice_no", &payload.invoice_no),
        ),
        SourceType::Quotation => (
            Some(DocumentStatus::Unpaid),
            Some(ServiceStatus::Pending),
            None,
        ),
    };

    let created_at = match non_blank(&payload.created_date) {
        Some(raw) => {
            let parsed = parse_created_date(raw);
            if parsed.is_none() {
                errors.add(
                    "created_date",
                    violation("date", "created_date is not a valid date"),
                );
            }
            parsed
        }
        None => None,
    };

    if !errors.is_empty() {
        return None;
    }

    let client = match (payload.client_id, non_blank(&payload.customer_name)) {
        (Some(client_id), _) => ClientRef::Existing(client_id),
        (None, Some(name)) => ClientRef::NewFromName {
            name: name.to_string(),
            phone: optional_text(&payload.number),
            address: optional_text(&payload.address),
        },
        (None, None) => ClientRef::None,
    };

    Some(DocumentHeader {
        source_type,
        client,
        vehicle_id: payload.vehicle_id,
        vehicle: VehicleFields {
            plate_number: optional_text(&payload.plate),
            model: optional_text(&payload.model),
            year: optional_text(&payload.year),
            color: optional_text(&payload.color),
            odometer: optional_text(&payload.odometer),
        },
        customer_name: optional_text(&payload.customer_name),
        vehicle_name: optional_text(&payload.vehicle_name),
        status: status?,
        service_status: service_status?,
        subtotal: subtotal?,
        total_discount: total_discount.unwrap_or(Decimal::ZERO),
        vat_amount: vat_amount?,
        grand_total: grand_total?,
        payment_type: payment_type?,
        invoice_no,
        number: optional_text(&payload.number),
        address: optional_text(&payload.address),
        created_at,
    })
}

/// Price every item and normalize every job. Returns the lines only when
/// none of them broke a rule; each broken line is reported under `items`
/// or `jobs` with its index.
pub fn check_lines(
    payload: &DocumentPayload,
    errors: &mut ValidationErrors,
) -> Option<DocumentLines> {
    let mut lines = DocumentLines::default();
    let mut valid = true;

    for (index, input) in payload.items.iter().flatten().enumerate() {
        match price_line_item(input, index as i32) {
            Ok(item) => lines.items.push(item),
            Err(err) => {
                valid = false;
                errors.add(
                    "items",
                    violation("range", format!("items[{}].{} {}", index, err.field(), err)),
                );
            }
        }
    }

    for (index, input) in payload.jobs.iter().flatten().enumerate() {
        match input.total {
            Some(total) if !in_range(total) => {
                valid = false;
                errors.add(
                    "jobs",
                    violation("range", format!("jobs[{}].total is out of range", index)),
                );
            }
            total => lines.jobs.push(NewJob {
                total: to_cents(total.unwrap_or(Decimal::ZERO)),
                ..NewJob::from_input(input, index as i32)
            }),
        }
    }

    valid.then_some(lines)
}

/// Rules for a quick status edit on an invoicing document.
pub fn check_status_update(
    status: &Option<String>,
    service_status: &Option<String>,
    errors: &mut ValidationErrors,
) -> Option<(DocumentStatus, Option<ServiceStatus>)> {
    let status = check_status(errors, status);
    let service_status = check_service_status(errors, service_status, false);
    if !errors.is_empty() {
        return None;
    }
    Some((status?, service_status))
}

/// Rules that need storage: linked client and vehicle must exist, and an
/// invoicing `invoice_no` must not be used by another invoicing document.
pub async fn check_references<R>(
    repo: &mut R,
    payload: &DocumentPayload,
    source_type: SourceType,
    exclude: Option<Uuid>,
    errors: &mut ValidationErrors,
) -> Result<(), AppError>
where
    R: ClientRepo + VehicleRepo + DocumentRepo + ?Sized,
{
    if let Some(client_id) = payload.client_id {
        if repo.get_client(client_id).await?.is_none() {
            errors.add(
                "client_id",
                violation("exists", format!("client {} does not exist", client_id)),
            );
        }
    }

    if let Some(vehicle_id) = payload.vehicle_id {
        if repo.get_vehicle(vehicle_id).await?.is_none() {
            errors.add(
                "vehicle_id",
                violation("exists", format!("vehicle {} does not exist", vehicle_id)),
            );
        }
    }

    if source_type == SourceType::Invoicing {
        if let Some(invoice_no) = non_blank(&payload.invoice_no) {
            if repo.invoice_no_taken(invoice_no, exclude).await? {
                errors.add(
                    "invoice_no",
                    violation(
                        "unique",
                        format!("invoice number '{}' is already in use", invoice_no),
                    ),
                );
            }
        }
    }

    Ok(())
}

/// Turn collected violations into the operation's result. A lone duplicate
/// invoice number is reported as such; anything else as a validation error.
pub fn finish<T>(
    errors: ValidationErrors,
    payload: &DocumentPayload,
    checked: Option<T>,
) -> Result<T, DocumentError> {
    if errors.is_empty() {
        if let Some(value) = checked {
            return Ok(value);
        }
    }

    let fields = errors.field_errors();
    let only_duplicate = fields.len() == 1
        && fields
            .get("invoice_no")
            .is_some_and(|errs| errs.iter().all(|e| e.code == "unique"));

    if only_duplicate {
        let invoice_no = non_blank(&payload.invoice_no).unwrap_or_default().to_string();
        return Err(DocumentError::DuplicateInvoiceNumber(invoice_no));
    }

    Err(DocumentError::Validation(errors))
}
