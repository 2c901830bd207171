//! Inventory (parts stock) model for garage-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Stocked part.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Part {
    pub part_id: Uuid,
    pub item_name: String,
    pub part_number: Option<String>,
    /// Stock on hand.
    pub quantity: i32,
    pub selling_price: Decimal,
    pub acquisition_price: Option<Decimal>,
    pub created_utc: DateTime<Utc>,
}

/// Input for adding a part to the catalogue.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPart {
    #[validate(length(min = 1, message = "Item name cannot be empty"))]
    pub item_name: String,
    pub part_number: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub selling_price: Decimal,
    pub acquisition_price: Option<Decimal>,
}
