//! Invoice lifecycle integration tests.

mod common;

use common::{dec, id_of, invoice_body, quotation_body, TestApp};
use rust_decimal::Decimal;
use serde_json::{json, Value};

#[tokio::test]
async fn line_total_is_quantity_times_discounted_price() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Brake pad", 10).await;

    let body = app
        .create("/invoices", &invoice_body("INV-1001", "unpaid", part_id))
        .await;

    let item = &body["items"][0];
    assert_eq!(dec(&item["original_price"]), Decimal::from(100));
    assert_eq!(dec(&item["line_total"]), Decimal::from(180));
    assert_eq!(dec(&item["discounted_price"]), Decimal::from(180));
    assert_eq!(item["part"]["item_name"], "Brake pad");
    assert_eq!(body["status"], "unpaid");
    assert_eq!(body["source_type"], "invoicing");
    assert_eq!(app.stock(part_id).await, 10);
}

#[tokio::test]
async fn marking_paid_deducts_stock_exactly_once() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Brake pad", 10).await;
    let body = app
        .create("/invoices", &invoice_body("INV-1002", "unpaid", part_id))
        .await;
    let id = id_of(&body, "document_id");

    let response = app
        .put(&format!("/invoices/{}", id), &json!({ "status": "paid" }))
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "paid");
    assert_eq!(updated["service_status"], "pending");
    assert_eq!(app.stock(part_id).await, 8);

    let response = app
        .put(
            &format!("/invoices/{}", id),
            &json!({ "status": "paid", "service_status": "done" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["service_status"], "done");
    assert_eq!(app.stock(part_id).await, 8);
}

#[tokio::test]
async fn invoice_created_as_paid_deducts_on_create() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Spark plug", 4).await;

    app.create("/invoices", &invoice_body("INV-1003", "paid", part_id))
        .await;

    assert_eq!(app.stock(part_id).await, 2);
}

#[tokio::test]
async fn cancelling_never_touches_stock() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Spark plug", 4).await;
    let body = app
        .create("/invoices", &invoice_body("INV-1004", "unpaid", part_id))
        .await;
    let id = id_of(&body, "document_id");

    for status in ["cancelled", "voided"] {
        let response = app
            .put(&format!("/invoices/{}", id), &json!({ "status": status }))
            .await;
        assert_eq!(response.status(), 200);
    }
    assert_eq!(app.stock(part_id).await, 4);
}

#[tokio::test]
async fn unknown_part_is_skipped_during_deduction() {
    let app = TestApp::spawn().await;
    let known = app.seed_part("Oil filter", 3).await;
    let mut body = invoice_body("INV-1005", "paid", known);
    body["items"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "part_id": uuid::Uuid::new_v4().to_string(), "quantity": 1, "price": 50 }));

    let created = app.create("/invoices", &body).await;

    assert_eq!(created["items"].as_array().unwrap().len(), 2);
    assert!(created["items"][1]["part"].is_null());
    assert_eq!(app.stock(known).await, 1);
}

#[tokio::test]
async fn duplicate_invoice_number_is_rejected() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Fan belt", 5).await;
    app.create("/invoices", &invoice_body("INV-2000", "unpaid", part_id))
        .await;

    let response = app
        .post("/invoices", &invoice_body("INV-2000", "unpaid", part_id))
        .await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["invoice_no"][0]["rule"], "unique");
}

#[tokio::test]
async fn editing_keeps_own_invoice_number() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Fan belt", 5).await;
    let created = app
        .create("/invoices", &invoice_body("INV-2001", "unpaid", part_id))
        .await;
    let id = id_of(&created, "document_id");

    let mut edit = invoice_body("INV-2001", "unpaid", part_id);
    edit["grand_total"] = json!(1500);
    let response = app.put(&format!("/invoices/{}", id), &edit).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(dec(&body["grand_total"]), Decimal::from(1500));
}

#[tokio::test]
async fn editing_to_another_invoices_number_is_rejected() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Fan belt", 5).await;
    app.create("/invoices", &invoice_body("INV-2002", "unpaid", part_id))
        .await;
    let second = app
        .create("/invoices", &invoice_body("INV-2003", "unpaid", part_id))
        .await;
    let id = id_of(&second, "document_id");

    let response = app
        .put(
            &format!("/invoices/{}", id),
            &invoice_body("INV-2002", "unpaid", part_id),
        )
        .await;

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn missing_fields_are_all_reported() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/invoices",
            &json!({ "status": "refunded", "client_id": uuid::Uuid::new_v4().to_string() }),
        )
        .await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    let fields = body["fields"].as_object().unwrap();
    for field in [
        "subtotal",
        "vat_amount",
        "grand_total",
        "payment_type",
        "status",
        "service_status",
        "invoice_no",
        "client_id",
    ] {
        assert!(fields.contains_key(field), "missing violation for {}", field);
    }
    assert_eq!(body["fields"]["status"][0]["rule"], "in");
    assert_eq!(body["fields"]["client_id"][0]["rule"], "exists");

    let list: Value = app.get("/invoices").await.json().await.unwrap();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn customer_name_registers_client_and_vehicle() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Battery", 2).await;
    let mut body = invoice_body("INV-3000", "unpaid", part_id);
    body["customer_name"] = json!("Lea Salonga");
    body["number"] = json!("0917-000-1111");
    body["plate"] = json!("ABC 1234");
    body["model"] = json!("Civic");

    let created = app.create("/invoices", &body).await;

    assert_eq!(created["client"]["name"], "Lea Salonga");
    assert_eq!(created["client"]["phone"], "0917-000-1111");
    assert_eq!(created["vehicle"]["plate_number"], "ABC 1234");
    assert_eq!(created["vehicle"]["client_id"], created["client"]["client_id"]);
}

#[tokio::test]
async fn existing_client_is_linked_not_duplicated() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Battery", 2).await;
    let mut first = invoice_body("INV-3001", "unpaid", part_id);
    first["customer_name"] = json!("Rico Blanco");
    let created = app.create("/invoices", &first).await;
    let client_id = id_of(&created["client"], "client_id");

    let mut second = invoice_body("INV-3002", "unpaid", part_id);
    second["client_id"] = json!(client_id.to_string());
    second["customer_name"] = json!("Rico Blanco");
    let linked = app.create("/invoices", &second).await;

    assert_eq!(id_of(&linked["client"], "client_id"), client_id);
    let search: Value = app
        .get("/clients/search?q=rico")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(search["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn referenced_vehicle_is_overwritten() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Battery", 2).await;
    let mut first = invoice_body("INV-3003", "unpaid", part_id);
    first["plate"] = json!("OLD 111");
    first["color"] = json!("Red");
    let created = app.create("/invoices", &first).await;
    let vehicle_id = id_of(&created["vehicle"], "vehicle_id");

    let mut second = invoice_body("INV-3004", "unpaid", part_id);
    second["vehicle_id"] = json!(vehicle_id.to_string());
    second["plate"] = json!("OLD 111");
    second["odometer"] = json!("88000");
    app.create("/invoices", &second).await;

    let vehicle: Value = app
        .get(&format!("/vehicles/{}", vehicle_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(vehicle["odometer"], "88000");
    assert!(vehicle["color"].is_null());
}

#[tokio::test]
async fn replacing_twice_yields_the_same_items() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Coolant", 20).await;
    let technician_id = app.seed_technician("Mang Kanor").await;
    let created = app
        .create("/invoices", &invoice_body("INV-4000", "unpaid", part_id))
        .await;
    let id = id_of(&created, "document_id");

    let mut edit = invoice_body("INV-4000", "unpaid", part_id);
    edit["items"] = json!([
        { "part_id": part_id.to_string(), "quantity": 1, "original_price": 300 },
        { "manual_part_name": "Rag", "quantity": 3, "manual_selling_price": 15, "discount_value": 5 }
    ]);
    edit["jobs"] = json!([
        { "job_description": "Flush radiator", "technician_id": technician_id.to_string(), "total": 400 },
        { "job_description": "Inspection", "technician_id": "", "total": 0 }
    ]);

    let shape = |body: &Value| -> Vec<(Decimal, Decimal, Value)> {
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| {
                (
                    dec(&item["original_price"]),
                    dec(&item["line_total"]),
                    item["quantity"].clone(),
                )
            })
            .collect()
    };

    let first: Value = app
        .put(&format!("/invoices/{}", id), &edit)
        .await
        .json()
        .await
        .unwrap();
    let second: Value = app
        .put(&format!("/invoices/{}", id), &edit)
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(shape(&first), shape(&second));
    assert_eq!(
        shape(&second),
        vec![
            (Decimal::from(300), Decimal::from(300), json!(1)),
            (Decimal::from(15), Decimal::from(30), json!(3)),
        ]
    );
    let jobs = second["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["technician"]["name"], "Mang Kanor");
    assert!(jobs[1]["technician_id"].is_null());
    assert_eq!(app.stock(part_id).await, 20);
}

#[tokio::test]
async fn full_edit_into_paid_deducts_the_new_items() {
    let app = TestApp::spawn().await;
    let old_part = app.seed_part("Old part", 10).await;
    let new_part = app.seed_part("New part", 10).await;
    let created = app
        .create("/invoices", &invoice_body("INV-4001", "unpaid", old_part))
        .await;
    let id = id_of(&created, "document_id");

    let response = app
        .put(
            &format!("/invoices/{}", id),
            &invoice_body("INV-4001", "paid", new_part),
        )
        .await;
    assert_eq!(response.status(), 200);

    assert_eq!(app.stock(old_part).await, 10);
    assert_eq!(app.stock(new_part).await, 8);

    app.put(
        &format!("/invoices/{}", id),
        &invoice_body("INV-4001", "paid", new_part),
    )
    .await;
    assert_eq!(app.stock(new_part).await, 8);
}

#[tokio::test]
async fn created_date_backdates_the_document() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Hose", 5).await;
    let mut body = invoice_body("INV-5000", "unpaid", part_id);
    body["created_date"] = json!("2024-02-29");

    let created = app.create("/invoices", &body).await;

    assert!(created["created_at"]
        .as_str()
        .unwrap()
        .starts_with("2024-02-29T00:00:00"));
}

#[tokio::test]
async fn delete_removes_document_and_keeps_stock() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Filter", 10).await;
    let mut body = invoice_body("INV-6000", "paid", part_id);
    body["items"] = json!([
        { "part_id": part_id.to_string(), "quantity": 1, "price": 10 },
        { "part_id": part_id.to_string(), "quantity": 1, "price": 10 },
        { "manual_part_name": "Labor kit", "quantity": 1, "manual_selling_price": 10 }
    ]);
    body["jobs"] = json!([
        { "job_description": "Diagnose", "total": 100 },
        { "job_description": "Repair", "total": 200 }
    ]);
    let created = app.create("/invoices", &body).await;
    let id = id_of(&created, "document_id");
    assert_eq!(app.stock(part_id).await, 8);

    let response = app.delete(&format!("/invoices/{}", id)).await;
    assert_eq!(response.status(), 204);

    let response = app.get(&format!("/invoices/{}", id)).await;
    assert_eq!(response.status(), 404);
    assert_eq!(app.stock(part_id).await, 8);

    let response = app.delete(&format!("/invoices/{}", id)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn updating_unknown_invoice_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .put(
            &format!("/invoices/{}", uuid::Uuid::new_v4()),
            &json!({ "status": "paid" }),
        )
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn quotation_cannot_be_paid_through_invoice_route() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Spark plug", 10).await;
    let mut quotation = quotation_body();
    quotation["items"] = json!([{ "part_id": part_id.to_string(), "quantity": 2, "price": 100 }]);
    let created = app.create("/quotations", &quotation).await;
    let id = id_of(&created, "document_id");

    let response = app
        .put(&format!("/invoices/{}", id), &json!({ "status": "paid" }))
        .await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["status"][0]["rule"], "invoicing_only");

    let response = app
        .put(
            &format!("/quotations/{}", id),
            &json!({ "quick_update": 1, "source_type": "invoicing" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let switched: Value = response.json().await.unwrap();
    assert_eq!(switched["status"], "unpaid");
    assert_eq!(app.stock(part_id).await, 10);

    let response = app
        .put(&format!("/invoices/{}", id), &json!({ "status": "paid" }))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(app.stock(part_id).await, 8);
}

#[tokio::test]
async fn concurrent_paid_updates_deduct_once() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Brake pad", 10).await;
    let body = app
        .create("/invoices", &invoice_body("INV-1200", "unpaid", part_id))
        .await;
    let path = format!("/invoices/{}", id_of(&body, "document_id"));
    let paid = json!({ "status": "paid" });

    let (first, second) = tokio::join!(app.put(&path, &paid), app.put(&path, &paid));

    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);
    assert_eq!(app.stock(part_id).await, 8);
}

#[tokio::test]
async fn status_with_header_fields_is_a_full_edit() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Brake pad", 10).await;
    let body = app
        .create("/invoices", &invoice_body("INV-1201", "unpaid", part_id))
        .await;
    let id = id_of(&body, "document_id");

    let response = app
        .put(
            &format!("/invoices/{}", id),
            &json!({ "status": "paid", "customer_name": "X", "payment_type": "card" }),
        )
        .await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["subtotal"][0]["rule"], "required");
    assert_eq!(body["fields"]["invoice_no"][0]["rule"], "required");
    assert_eq!(app.stock(part_id).await, 10);
}

#[tokio::test]
async fn non_numeric_amount_is_reported_with_other_violations() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Brake pad", 10).await;
    let mut body = invoice_body("INV-1202", "unpaid", part_id);
    body["subtotal"] = json!("abc");
    body["items"][0]["quantity"] = json!("two");
    body.as_object_mut().unwrap().remove("status");

    let response = app.post("/invoices", &body).await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["subtotal"][0]["rule"], "numeric");
    assert_eq!(body["fields"]["subtotal"].as_array().unwrap().len(), 1);
    assert_eq!(body["fields"]["status"][0]["rule"], "required");
    assert_eq!(body["fields"]["items"][0]["rule"], "integer");
    assert_eq!(
        body["fields"]["items"][0]["message"],
        "items[0].quantity must be an integer"
    );
}

#[tokio::test]
async fn unparseable_body_is_a_field_violation() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .post(app.url("/invoices"))
        .header("content-type", "application/json")
        .body("{\"subtotal\": ")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["body"][0]["rule"], "format");
}

#[tokio::test]
async fn oversized_line_is_rejected_not_crashed() {
    let app = TestApp::spawn().await;
    let mut body = quotation_body();
    body["items"] = json!([{
        "manual_part_name": "Gold rim",
        "quantity": 2147483647,
        "original_price": "79228162514264337593543950335"
    }]);

    let response = app.post("/quotations", &body).await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["items"][0]["rule"], "range");

    let quotations: Value = app.get("/quotations").await.json().await.unwrap();
    assert_eq!(quotations["total"], 0);
}

#[tokio::test]
async fn amounts_beyond_storage_are_rejected() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Brake pad", 10).await;
    let mut body = invoice_body("INV-1203", "unpaid", part_id);
    body["grand_total"] = json!(100_000_000_000i64);
    body["items"][0]["price"] = json!("20000000000");

    let response = app.post("/invoices", &body).await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["grand_total"][0]["rule"], "range");
    assert_eq!(
        body["fields"]["items"][0]["message"],
        "items[0].price is out of range"
    );
}

#[tokio::test]
async fn sub_cent_prices_keep_line_total_consistent() {
    let app = TestApp::spawn().await;
    let mut body = quotation_body();
    body["items"] = json!([{
        "manual_part_name": "Washer",
        "quantity": 3,
        "original_price": "0.005"
    }]);

    let created = app.create("/quotations", &body).await;

    let item = &created["items"][0];
    assert_eq!(dec(&item["original_price"]), Decimal::new(1, 2));
    assert_eq!(dec(&item["line_total"]), Decimal::new(3, 2));
}
