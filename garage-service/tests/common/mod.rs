//! Test helper module for garage-service integration tests.
//!
//! Spawns the HTTP application on a random port over in-memory storage.

#![allow(dead_code)]

use garage_service::config::GarageConfig;
use garage_service::services::{MemoryStore, Store};
use garage_service::startup::Application;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Test application with running HTTP server.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn Store>,
    client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application with empty storage.
    pub async fn spawn() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = Application::build_with_store(GarageConfig::in_memory(0), store.clone())
            .await
            .expect("Failed to build application");
        let port = app.port();

        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            store,
            client: reqwest::Client::new(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Add a part with the given stock and return its id.
    pub async fn seed_part(&self, name: &str, quantity: i32) -> Uuid {
        let response = self
            .post(
                "/parts",
                &json!({
                    "item_name": name,
                    "part_number": format!("PN-{}", name.len()),
                    "quantity": quantity,
                    "selling_price": "100.00"
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse part");
        id_of(&body, "part_id")
    }

    pub async fn seed_technician(&self, name: &str) -> Uuid {
        let response = self
            .post("/technicians", &json!({ "name": name, "position": "Mechanic" }))
            .await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse technician");
        id_of(&body, "technician_id")
    }

    pub async fn stock(&self, part_id: Uuid) -> i64 {
        let body: Value = self
            .get(&format!("/parts/{}", part_id))
            .await
            .json()
            .await
            .expect("Failed to parse part");
        body["quantity"].as_i64().expect("quantity")
    }

    /// Create a document and return the response body.
    pub async fn create(&self, route: &str, body: &Value) -> Value {
        let response = self.post(route, body).await;
        assert_eq!(response.status(), 201, "create failed on {}", route);
        response.json().await.expect("Failed to parse document")
    }
}

pub fn id_of(body: &Value, field: &str) -> Uuid {
    body[field]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("missing {} in {}", field, body))
}

/// Decimal fields are serialized as strings.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

/// The invoice from the shop's standard walk-through: one part line,
/// two units at 100 with 10 off each.
pub fn invoice_body(invoice_no: &str, status: &str, part_id: Uuid) -> Value {
    json!({
        "subtotal": 1000,
        "total_discount": 0,
        "vat_amount": 120,
        "grand_total": 1120,
        "payment_type": "cash",
        "status": status,
        "service_status": "pending",
        "invoice_no": invoice_no,
        "items": [{
            "part_id": part_id.to_string(),
            "quantity": 2,
            "price": 100,
            "discount_value": 10
        }],
        "jobs": []
    })
}

pub fn quotation_body() -> Value {
    json!({
        "subtotal": 500,
        "total_discount": 0,
        "vat_amount": 60,
        "grand_total": 560,
        "payment_type": "card",
        "items": [{
            "manual_part_name": "Wiper blade",
            "quantity": 2,
            "manual_selling_price": 250
        }]
    })
}
