//! Job (technician assignment) model for garage-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{empty_string_as_none, Technician};

/// Labour line on a document.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub job_description: String,
    pub technician_id: Option<Uuid>,
    pub total: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Job as submitted on a document form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobInput {
    pub job_description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub technician_id: Option<Uuid>,
    pub total: Option<Decimal>,
}

/// Input for storing a job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub job_description: String,
    pub technician_id: Option<Uuid>,
    pub total: Decimal,
    pub sort_order: i32,
}

impl NewJob {
    /// Normalize a submitted job; missing fields fall back to empty/zero.
    pub fn from_input(input: &JobInput, sort_order: i32) -> Self {
        Self {
            job_description: input.job_description.clone().unwrap_or_default(),
            technician_id: input.technician_id,
            total: input.total.unwrap_or(Decimal::ZERO),
            sort_order,
        }
    }
}

/// Job with its technician expanded.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub technician: Option<Technician>,
}
