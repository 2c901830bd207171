//! Vehicle model for garage-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::non_blank;

/// Vehicle serviced by the shop.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub vehicle_id: Uuid,
    pub client_id: Option<Uuid>,
    pub plate_number: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub color: Option<String>,
    pub odometer: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Descriptive vehicle fields as submitted on a document form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFields {
    pub plate_number: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub color: Option<String>,
    pub odometer: Option<String>,
}

impl VehicleFields {
    /// True when no descriptive field carries a value.
    pub fn is_empty(&self) -> bool {
        [
            &self.plate_number,
            &self.model,
            &self.year,
            &self.color,
            &self.odometer,
        ]
        .into_iter()
        .all(|field| non_blank(field).is_none())
    }
}
