//! Client model for garage-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Customer of the shop.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub client_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a client.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

/// How a document names its customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef {
    /// A client already on file.
    Existing(Uuid),
    /// No client on file yet; register one under this name.
    NewFromName {
        name: String,
        phone: Option<String>,
        address: Option<String>,
    },
    /// Walk-in without a name; nothing is linked.
    None,
}
