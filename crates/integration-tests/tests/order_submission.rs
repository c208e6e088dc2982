//! End-to-end tests for the public order flow.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations and seed applied
//! - The server running (cargo run -p krambam-server)
//!
//! Run with: cargo test -p krambam-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use krambam_integration_tests::{base_url, client, login, pickup_order};

/// Fetch the first product and pickup location from the live catalog.
async fn catalog_ids(client: &reqwest::Client) -> (i32, i32) {
    let base_url = base_url();

    let products: Value = client
        .get(format!("{base_url}/api/store/products/krambambouli"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let product_id = products[0]["id"].as_i64().unwrap();

    let locations: Value = client
        .get(format!("{base_url}/api/krambambouli/pickup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let location_id = locations[0]["id"].as_i64().unwrap();

    (
        i32::try_from(product_id).unwrap(),
        i32::try_from(location_id).unwrap(),
    )
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn pickup_order_is_created() {
    let client = client();
    let base_url = base_url();
    let (product_id, location_id) = catalog_ids(&client).await;

    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&pickup_order(product_id, location_id))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["customerId"].as_i64().unwrap() > 0);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn delivery_order_requires_an_address() {
    let client = client();
    let base_url = base_url();
    let (product_id, _) = catalog_ids(&client).await;

    // Delivery without any address fields: every missing field reported.
    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "deliveryOption": "delivery",
            "orders": [{ "productId": product_id, "amount": 1 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"streetName"));
    assert!(fields.contains(&"streetNumber"));
    assert!(fields.contains(&"post"));
    assert!(fields.contains(&"city"));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn unknown_postal_code_is_rejected() {
    let client = client();
    let base_url = base_url();
    let (product_id, _) = catalog_ids(&client).await;

    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "deliveryOption": "delivery",
            "streetName": "Naamsestraat",
            "streetNumber": 1,
            "post": 9999,
            "city": "Nergenshuizen",
            "orders": [{ "productId": product_id, "amount": 1 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "post");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn an_all_zero_order_is_rejected() {
    let client = client();
    let base_url = base_url();
    let (product_id, location_id) = catalog_ids(&client).await;

    let mut order = pickup_order(product_id, location_id);
    order["orders"] = json!([{ "productId": product_id, "amount": 0 }]);

    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&order)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn unknown_product_rolls_back_the_whole_order() {
    let client = client();
    let base_url = base_url();
    let (product_id, location_id) = catalog_ids(&client).await;

    let mut order = pickup_order(product_id, location_id);
    order["orders"] = json!([
        { "productId": product_id, "amount": 1 },
        { "productId": 999_999, "amount": 1 },
    ]);

    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&order)
        .send()
        .await
        .unwrap();

    // Server-side pricing never finds product 999999 in the catalog.
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn failed_fulfillment_insert_leaves_no_partial_rows() {
    let client = client();
    let base_url = base_url();
    let (product_id, _) = catalog_ids(&client).await;
    login(&client).await;

    let totals_before = totals_for(&client, product_id).await;
    let customers_before = report_total(&client).await;

    // A nonexistent pickup location passes validation and pricing; the
    // foreign key only fails inside the write transaction, after the
    // customer row has been inserted.
    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&pickup_order(product_id, 999_999))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // The rollback must take the customer row and its line items with it.
    assert_eq!(totals_for(&client, product_id).await, totals_before);
    assert_eq!(report_total(&client).await, customers_before);
}

/// Total customer count from the staff report (needs a logged-in client).
async fn report_total(client: &reqwest::Client) -> u64 {
    let page: Value = client
        .get(format!(
            "{}/api/krambambouli/orders/customers?page=1&pageSize=1",
            base_url()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    page["total"].as_u64().unwrap()
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn seeded_cantus_is_served() {
    let client = client();

    let resp = client
        .get(format!("{}/api/krambambouli/cantus", base_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cantus: Value = resp.json().await.unwrap();
    assert!(!cantus["name"].as_str().unwrap().is_empty());
    assert!(cantus["location"].is_string());
    assert!(cantus["date"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn product_totals_are_public_and_aggregated() {
    let client = client();
    let base_url = base_url();
    let (product_id, location_id) = catalog_ids(&client).await;

    let before = totals_for(&client, product_id).await;

    let resp = client
        .post(format!("{base_url}/api/krambambouli/order"))
        .json(&pickup_order(product_id, location_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let after = totals_for(&client, product_id).await;
    assert_eq!(after, before + 2);
}

async fn totals_for(client: &reqwest::Client, product_id: i32) -> u64 {
    let totals: Value = client
        .get(format!("{}/api/krambambouli/orders", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    totals
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["productId"] == i64::from(product_id))
        .map_or(0, |t| t["total"].as_u64().unwrap())
}
