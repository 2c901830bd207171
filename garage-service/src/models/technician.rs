//! Technician model for garage-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Technician that jobs can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Technician {
    pub technician_id: Uuid,
    pub name: String,
    pub position: String,
    pub created_utc: DateTime<Utc>,
}

/// Input for registering a technician.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTechnician {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Position cannot be empty"))]
    pub position: String,
}
