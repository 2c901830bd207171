//! Document listing and party autocomplete tests.

mod common;

use common::{invoice_body, quotation_body, TestApp};
use serde_json::{json, Value};

async fn seed_invoices(app: &TestApp, count: usize) {
    let part_id = app.seed_part("Grease", 100).await;
    for n in 0..count {
        let mut body = invoice_body(&format!("INV-{:04}", n), "unpaid", part_id);
        body["created_date"] = json!(format!("2024-03-{:02}", n + 1));
        app.create("/invoices", &body).await;
    }
}

#[tokio::test]
async fn invoices_are_listed_newest_first_with_pages() {
    let app = TestApp::spawn().await;
    seed_invoices(&app, 5).await;

    let first: Value = app
        .get("/invoices?page=1&per_page=2")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["total"], 5);
    assert_eq!(first["per_page"], 2);
    assert_eq!(first["last_page"], 3);
    let numbers: Vec<&str> = first["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["invoice_no"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["INV-0004", "INV-0003"]);

    let last: Value = app
        .get("/invoices?page=3&per_page=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(last["items"].as_array().unwrap().len(), 1);
    assert_eq!(last["items"][0]["invoice_no"], "INV-0000");
}

#[tokio::test]
async fn invoice_search_matches_client_and_plate() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Grease", 100).await;

    let mut named = invoice_body("INV-8000", "unpaid", part_id);
    named["customer_name"] = json!("Bamboo Manalac");
    app.create("/invoices", &named).await;

    let mut plated = invoice_body("INV-8001", "unpaid", part_id);
    plated["plate"] = json!("NCR 7788");
    app.create("/invoices", &plated).await;

    app.create("/invoices", &invoice_body("INV-8002", "unpaid", part_id))
        .await;

    let by_name: Value = app
        .get("/invoices?search=bamboo")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_name["total"], 1);
    assert_eq!(by_name["items"][0]["client_name"], "Bamboo Manalac");

    let by_plate: Value = app
        .get("/invoices?search=7788")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_plate["total"], 1);
    assert_eq!(by_plate["items"][0]["plate_number"], "NCR 7788");

    let by_number: Value = app
        .get("/invoices?search=INV-8002")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_number["total"], 1);
}

#[tokio::test]
async fn listings_are_split_by_source_type() {
    let app = TestApp::spawn().await;
    seed_invoices(&app, 2).await;
    app.create("/quotations", &quotation_body()).await;

    let invoices: Value = app.get("/invoices").await.json().await.unwrap();
    let quotations: Value = app.get("/quotations").await.json().await.unwrap();

    assert_eq!(invoices["total"], 2);
    assert_eq!(quotations["total"], 1);
    assert_eq!(quotations["items"][0]["source_type"], "quotation");
}

#[tokio::test]
async fn client_search_pages_with_more_flag() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Grease", 100).await;
    for (n, name) in ["Anna Cruz", "Ben Cruz", "Carla Cruz"].iter().enumerate() {
        let mut body = invoice_body(&format!("INV-90{}", n), "unpaid", part_id);
        body["customer_name"] = json!(name);
        app.create("/invoices", &body).await;
    }

    let first: Value = app
        .get("/clients/search?q=cruz&page=1&per_page=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["results"].as_array().unwrap().len(), 2);
    assert_eq!(first["results"][0]["name"], "Anna Cruz");
    assert_eq!(first["more"], true);

    let second: Value = app
        .get("/clients/search?q=cruz&page=2&per_page=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["results"].as_array().unwrap().len(), 1);
    assert_eq!(second["more"], false);
}

#[tokio::test]
async fn vehicle_search_filters_by_owner() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Grease", 100).await;

    let mut first = invoice_body("INV-9100", "unpaid", part_id);
    first["customer_name"] = json!("Owner One");
    first["plate"] = json!("ABC 100");
    let created = app.create("/invoices", &first).await;
    let owner = created["client"]["client_id"].as_str().unwrap().to_string();

    let mut second = invoice_body("INV-9101", "unpaid", part_id);
    second["customer_name"] = json!("Owner Two");
    second["plate"] = json!("ABC 200");
    app.create("/invoices", &second).await;

    let all: Value = app
        .get("/vehicles/search?q=abc")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let owned: Value = app
        .get(&format!("/vehicles/search?q=abc&client_id={}", owner))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(owned.as_array().unwrap().len(), 1);
    assert_eq!(owned[0]["plate_number"], "ABC 100");

    let blank_owner: Value = app
        .get("/vehicles/search?q=abc&client_id=")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(blank_owner.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn vehicle_search_is_capped() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Grease", 100).await;
    for n in 0..25 {
        let mut body = invoice_body(&format!("INV-92{:02}", n), "unpaid", part_id);
        body["plate"] = json!(format!("ZZZ {:03}", n));
        app.create("/invoices", &body).await;
    }

    let found: Value = app
        .get("/vehicles/search?q=zzz")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn parts_and_technicians_are_listed() {
    let app = TestApp::spawn().await;
    app.seed_part("Air filter", 4).await;
    app.seed_technician("Mang Jose").await;

    let parts: Value = app.get("/parts").await.json().await.unwrap();
    assert_eq!(parts[0]["item_name"], "Air filter");
    assert_eq!(parts[0]["quantity"], 4);

    let technicians: Value = app.get("/technicians").await.json().await.unwrap();
    assert_eq!(technicians[0]["name"], "Mang Jose");

    let response = app.post("/parts", &json!({ "item_name": "" })).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn far_client_pages_are_empty() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Grease", 100).await;
    let mut body = invoice_body("INV-9300", "unpaid", part_id);
    body["customer_name"] = json!("Anna Cruz");
    app.create("/invoices", &body).await;

    let response = app
        .get(&format!("/clients/search?q=&page={}&per_page=10", i64::MAX))
        .await;
    assert_eq!(response.status(), 200);
    let found: Value = response.json().await.unwrap();
    assert!(found["results"].as_array().unwrap().is_empty());
    assert_eq!(found["more"], false);

    let response = app.get(&format!("/invoices?page={}", i64::MAX)).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn client_search_matches_percent_literally() {
    let app = TestApp::spawn().await;
    let part_id = app.seed_part("Grease", 100).await;
    for (n, name) in ["100% Auto", "Anna Cruz"].iter().enumerate() {
        let mut body = invoice_body(&format!("INV-94{}", n), "unpaid", part_id);
        body["customer_name"] = json!(name);
        app.create("/invoices", &body).await;
    }

    let found: Value = app
        .get("/clients/search?q=%25")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found["results"].as_array().unwrap().len(), 1);
    assert_eq!(found["results"][0]["name"], "100% Auto");
}
