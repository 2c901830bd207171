//! Garage Service - Invoices, quotations, parties and parts stock for a repair shop.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::AppState;
