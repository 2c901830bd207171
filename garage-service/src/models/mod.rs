//! Domain models for garage-service.

mod client;
mod document;
mod inventory;
mod job;
mod line_item;
mod technician;
mod vehicle;

pub use client::{Client, ClientRef, NewClient};
pub use document::{
    Document, DocumentDetail, DocumentPayload, DocumentRecord, DocumentStatus, DocumentSummary,
    ListDocumentsFilter, MalformedField, Page, ServiceStatus, SourceType,
};
pub use inventory::{NewPart, Part};
pub use job::{Job, JobDetail, JobInput, NewJob};
pub use line_item::{LineItem, LineItemDetail, LineItemInput, NewLineItem};
pub use technician::{NewTechnician, Technician};
pub use vehicle::{Vehicle, VehicleFields};

use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Deserialize an optional id that form-style clients may send as `""`.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Treat blank strings as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
