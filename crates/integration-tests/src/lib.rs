//! End-to-end tests for the Krambambouli service.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations + seed
//! cargo run -p krambam-cli -- migrate
//! cargo run -p krambam-cli -- seed
//! cargo run -p krambam-cli -- staff create -e staff@test.local -p hunter2hunter2
//!
//! # Start the server, then:
//! cargo test -p krambam-integration-tests -- --ignored
//! ```
//!
//! All tests are `#[ignore]`d by default because they need a running
//! server and a seeded database.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the service (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("KRAMBAM_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// An HTTP client with a cookie store, so the staff token set by the login
/// endpoint is carried on subsequent requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Log in as the test staff account created in the setup steps.
///
/// # Panics
///
/// Panics if the login request fails or is rejected.
pub async fn login(client: &Client) {
    let email =
        std::env::var("KRAMBAM_TEST_STAFF_EMAIL").unwrap_or_else(|_| "staff@test.local".to_owned());
    let password =
        std::env::var("KRAMBAM_TEST_STAFF_PASSWORD").unwrap_or_else(|_| "hunter2hunter2".to_owned());

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(
        resp.status().is_success(),
        "staff login rejected: {}",
        resp.status()
    );
}

/// A minimal valid pickup order naming the given product and pickup
/// location ids.
#[must_use]
pub fn pickup_order(product_id: i32, pickup_location: i32) -> Value {
    json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "jane@example.com",
        "deliveryOption": "pick up",
        "pickupLocation": pickup_location,
        "orders": [{ "productId": product_id, "amount": 2 }],
    })
}
