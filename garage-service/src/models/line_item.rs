//! Line item model for garage-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{empty_string_as_none, Part};

/// Part or service line on a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub document_id: Uuid,
    pub part_id: Option<Uuid>,
    pub manual_part_name: Option<String>,
    pub manual_serial_number: Option<String>,
    pub manual_acquisition_price: Option<Decimal>,
    pub manual_selling_price: Option<Decimal>,
    pub quantity: i32,
    pub original_price: Decimal,
    pub discount_value: Decimal,
    pub discounted_price: Decimal,
    pub line_total: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Line item as submitted on a document form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub part_id: Option<Uuid>,
    pub manual_part_name: Option<String>,
    pub manual_serial_number: Option<String>,
    pub manual_acquisition_price: Option<Decimal>,
    pub manual_selling_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub original_price: Option<Decimal>,
    /// Unit price; used when `original_price` is absent.
    pub price: Option<Decimal>,
    pub discount_value: Option<Decimal>,
}

/// Priced line item ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub part_id: Option<Uuid>,
    pub manual_part_name: Option<String>,
    pub manual_serial_number: Option<String>,
    pub manual_acquisition_price: Option<Decimal>,
    pub manual_selling_price: Option<Decimal>,
    pub quantity: i32,
    pub original_price: Decimal,
    pub discount_value: Decimal,
    pub discounted_price: Decimal,
    pub line_total: Decimal,
    pub sort_order: i32,
}

/// Line item with its catalogue part expanded.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemDetail {
    #[serde(flatten)]
    pub item: LineItem,
    pub part: Option<Part>,
}
