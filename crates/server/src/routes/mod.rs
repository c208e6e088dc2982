//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! POST /api/krambambouli/order            - Submit an order (201 / 400 / 500)
//! GET  /api/krambambouli/orders           - Aggregate ordered amount per product
//! GET  /api/store/products/krambambouli   - Beverage catalog
//! GET  /api/krambambouli/pickup           - Active pickup locations
//! GET  /api/krambambouli/delivery         - Delivery zones with postal ranges
//! GET  /api/krambambouli/cantus           - The flagship cantus activity
//! POST /api/auth/login                    - Staff login, sets the auth cookie
//!
//! # Staff (Authorization cookie required, 401 otherwise)
//! GET  /api/krambambouli/orders/customers - Paginated, date-filtered report
//! PUT  /api/krambambouli/toggle-payment   - Set an order's paid flag
//! PUT  /api/krambambouli/toggle-fulfilled - Set an order's fulfilled flag
//! ```

pub mod auth;
pub mod catalog;
pub mod fulfillment;
pub mod orders;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::AppState;

/// Name filter restricting the catalog to the beverage products; both the
/// catalog endpoint and order pricing must see the same product set.
pub(crate) const PRODUCT_FILTER: &str = "krambambouli";

/// Assemble the full route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/krambambouli/order", post(orders::submit_order))
        .route("/api/krambambouli/orders", get(orders::product_totals))
        .route(
            "/api/krambambouli/orders/customers",
            get(orders::list_orders),
        )
        .route("/api/store/products/krambambouli", get(catalog::products))
        .route("/api/krambambouli/pickup", get(catalog::pickup_locations))
        .route("/api/krambambouli/delivery", get(catalog::delivery_zones))
        .route("/api/krambambouli/cantus", get(catalog::cantus))
        .route(
            "/api/krambambouli/toggle-payment",
            put(fulfillment::toggle_payment),
        )
        .route(
            "/api/krambambouli/toggle-fulfilled",
            put(fulfillment::toggle_fulfilled),
        )
        .route("/api/auth/login", post(auth::login))
}
