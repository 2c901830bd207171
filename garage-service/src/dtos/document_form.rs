//! Lenient decoding of document forms.
//!
//! Cashier screens post loosely typed JSON: amounts as strings, blank ids,
//! years as numbers. Each known field is coerced to its type here. A value
//! that cannot be read is dropped and recorded on the payload, so the form
//! rules report it alongside every other violation instead of the whole
//! body being refused.

use crate::models::{DocumentPayload, MalformedField};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use service_core::error::AppError;
use std::borrow::Cow;
use std::str::FromStr;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Amount,
    Integer,
    Id,
}

const HEADER_FIELDS: &[(&str, Kind)] = &[
    ("client_id", Kind::Id),
    ("vehicle_id", Kind::Id),
    ("customer_name", Kind::Text),
    ("vehicle_name", Kind::Text),
    ("plate", Kind::Text),
    ("model", Kind::Text),
    ("year", Kind::Text),
    ("color", Kind::Text),
    ("odometer", Kind::Text),
    ("subtotal", Kind::Amount),
    ("total_discount", Kind::Amount),
    ("vat_amount", Kind::Amount),
    ("grand_total", Kind::Amount),
    ("payment_type", Kind::Text),
    ("status", Kind::Text),
    ("service_status", Kind::Text),
    ("invoice_no", Kind::Text),
    ("number", Kind::Text),
    ("address", Kind::Text),
    ("created_date", Kind::Text),
];

const ITEM_FIELDS: &[(&str, Kind)] = &[
    ("part_id", Kind::Id),
    ("manual_part_name", Kind::Text),
    ("manual_serial_number", Kind::Text),
    ("manual_acquisition_price", Kind::Amount),
    ("manual_selling_price", Kind::Amount),
    ("original_price", Kind::Amount),
    ("price", Kind::Amount),
    ("discount_value", Kind::Amount),
    ("quantity", Kind::Integer),
];

const JOB_FIELDS: &[(&str, Kind)] = &[
    ("job_description", Kind::Text),
    ("technician_id", Kind::Id),
    ("total", Kind::Amount),
];

impl Kind {
    fn rule(self) -> &'static str {
        match self {
            Kind::Text => "string",
            Kind::Amount => "numeric",
            Kind::Integer => "integer",
            Kind::Id => "uuid",
        }
    }

    fn expectation(self) -> &'static str {
        match self {
            Kind::Text => "must be text",
            Kind::Amount => "must be a number",
            Kind::Integer => "must be an integer",
            Kind::Id => "must be a valid id",
        }
    }

    /// The value in the shape `DocumentPayload` reads, or `None` when it
    /// cannot be read at all. Blank strings become null.
    fn coerce(self, value: &Value) -> Option<Value> {
        if let Value::String(text) = value {
            if text.trim().is_empty() {
                return Some(Value::Null);
            }
        }

        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (Kind::Text, Value::String(_)) => Some(value.clone()),
            (Kind::Text, Value::Number(number)) => Some(Value::String(number.to_string())),
            (Kind::Text, Value::Bool(flag)) => Some(Value::String(flag.to_string())),
            (Kind::Amount, Value::Number(_)) => serde_json::from_value::<Decimal>(value.clone())
                .ok()
                .map(|_| value.clone()),
            (Kind::Amount, Value::String(text)) => {
                let text = text.trim();
                Decimal::from_str(text)
                    .or_else(|_| Decimal::from_scientific(text))
                    .ok()
                    .map(|amount| Value::String(amount.to_string()))
            }
            (Kind::Integer, Value::Number(number)) => number
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::from),
            (Kind::Integer, Value::String(text)) => text.trim().parse::<i32>().ok().map(Value::from),
            (Kind::Id, Value::String(text)) => Uuid::parse_str(text.trim())
                .ok()
                .map(|id| Value::String(id.to_string())),
            _ => None,
        }
    }
}

/// 422 for a body that is not a form at all.
pub fn malformed_body(message: impl Into<String>) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(
        "body",
        ValidationError::new("format").with_message(Cow::Owned(message.into())),
    );
    AppError::ValidationError(errors)
}

fn coerce_fields(
    fields: &mut Map<String, Value>,
    specs: &[(&'static str, Kind)],
    line: Option<(&'static str, usize)>,
    malformed: &mut Vec<MalformedField>,
) {
    for &(name, kind) in specs {
        let Some(value) = fields.get_mut(name) else {
            continue;
        };
        match kind.coerce(value) {
            Some(coerced) => *value = coerced,
            None => {
                *value = Value::Null;
                let (field, message) = match line {
                    Some((list, index)) => (
                        list,
                        format!("{}[{}].{} {}", list, index, name, kind.expectation()),
                    ),
                    None => (name, format!("{} {}", name, kind.expectation())),
                };
                malformed.push(MalformedField {
                    field,
                    rule: kind.rule(),
                    message,
                });
            }
        }
    }
}

fn coerce_lines(
    fields: &mut Map<String, Value>,
    list: &'static str,
    specs: &[(&'static str, Kind)],
    malformed: &mut Vec<MalformedField>,
) {
    match fields.get_mut(list) {
        None | Some(Value::Null) => {}
        Some(Value::Array(entries)) => {
            for (index, entry) in entries.iter_mut().enumerate() {
                match entry {
                    Value::Object(line) => coerce_fields(line, specs, Some((list, index)), malformed),
                    other => {
                        *other = Value::Object(Map::new());
                        malformed.push(MalformedField {
                            field: list,
                            rule: "object",
                            message: format!("{}[{}] must be an object", list, index),
                        });
                    }
                }
            }
        }
        Some(other) => {
            *other = Value::Null;
            malformed.push(MalformedField {
                field: list,
                rule: "array",
                message: format!("{} must be a list", list),
            });
        }
    }
}

/// Read a document form from a JSON body.
pub fn decode_document(body: Value) -> Result<DocumentPayload, AppError> {
    let Value::Object(mut fields) = body else {
        return Err(malformed_body("body must be a JSON object"));
    };

    let mut malformed = Vec::new();
    coerce_fields(&mut fields, HEADER_FIELDS, None, &mut malformed);
    coerce_lines(&mut fields, "items", ITEM_FIELDS, &mut malformed);
    coerce_lines(&mut fields, "jobs", JOB_FIELDS, &mut malformed);

    let mut payload: DocumentPayload = serde_json::from_value(Value::Object(fields))
        .map_err(|err| malformed_body(err.to_string()))?;
    payload.malformed = malformed;
    Ok(payload)
}
