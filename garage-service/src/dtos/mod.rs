mod document_form;

pub use document_form::{decode_document, malformed_body};

use crate::models::{empty_string_as_none, DocumentPayload, SourceType};
use crate::services::DocumentUpdate;
use serde::Deserialize;
use serde_json::Value;
use service_core::error::AppError;
use uuid::Uuid;

/// Body of `PUT /invoices/:id` and `PUT /quotations/:id`.
#[derive(Debug)]
pub struct UpdateDocumentRequest {
    /// Any non-null value marks a quotation source-type switch.
    pub quick_update: Option<Value>,
    pub source_type: Option<String>,
    pub payload: DocumentPayload,
}

impl UpdateDocumentRequest {
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        let Value::Object(mut fields) = body else {
            return Err(malformed_body("body must be a JSON object"));
        };
        let quick_update = fields.remove("quick_update").filter(|v| !v.is_null());
        let source_type = match fields.remove("source_type") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        };
        let payload = decode_document(Value::Object(fields))?;

        Ok(Self {
            quick_update,
            source_type,
            payload,
        })
    }

    /// Decide which kind of edit the body asks for on the given route.
    pub fn into_update(self, route: SourceType) -> DocumentUpdate {
        if route == SourceType::Quotation && self.quick_update.is_some() {
            if let Some(target) = self.source_type {
                return DocumentUpdate::SourceType(target);
            }
        }

        if route == SourceType::Invoicing && self.payload.is_status_only() {
            return DocumentUpdate::Status {
                status: self.payload.status,
                service_status: self.payload.service_status,
            };
        }

        DocumentUpdate::Full(self.payload)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ClientSearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub client_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> UpdateDocumentRequest {
        UpdateDocumentRequest::from_json(body).unwrap()
    }

    #[test]
    fn invoice_status_body_is_a_status_update() {
        let update = request(json!({ "status": "paid", "service_status": "done" }))
            .into_update(SourceType::Invoicing);
        assert!(matches!(
            update,
            DocumentUpdate::Status { status: Some(s), service_status: Some(ss) }
                if s == "paid" && ss == "done"
        ));
    }

    #[test]
    fn invoice_body_with_items_is_a_full_edit() {
        let update = request(json!({ "status": "paid", "items": [] }))
            .into_update(SourceType::Invoicing);
        assert!(matches!(update, DocumentUpdate::Full(_)));
    }

    #[test]
    fn quotation_quick_update_switches_source() {
        let update = request(json!({ "quick_update": 1, "source_type": "invoicing" }))
            .into_update(SourceType::Quotation);
        assert!(matches!(update, DocumentUpdate::SourceType(t) if t == "invoicing"));

        let update = request(json!({ "source_type": "invoicing", "subtotal": 10 }))
            .into_update(SourceType::Quotation);
        assert!(matches!(update, DocumentUpdate::Full(_)));
    }

    #[test]
    fn invoice_status_with_header_fields_is_a_full_edit() {
        let update = request(json!({
            "status": "paid",
            "customer_name": "X",
            "payment_type": "card"
        }))
        .into_update(SourceType::Invoicing);
        assert!(matches!(update, DocumentUpdate::Full(p) if p.customer_name.as_deref() == Some("X")));
    }

    #[test]
    fn unreadable_status_body_is_a_full_edit() {
        let update = request(json!({ "status": ["paid"] })).into_update(SourceType::Invoicing);
        assert!(matches!(update, DocumentUpdate::Full(p) if p.is_malformed("status")));
    }

    #[test]
    fn null_quick_update_is_ignored() {
        let update = request(json!({ "quick_update": null, "source_type": "invoicing", "status": "paid" }))
            .into_update(SourceType::Quotation);
        assert!(matches!(update, DocumentUpdate::Full(_)));
    }

    #[test]
    fn quotation_status_body_is_not_a_status_update() {
        let update = request(json!({ "status": "paid" })).into_update(SourceType::Quotation);
        assert!(matches!(update, DocumentUpdate::Full(_)));
    }
}
