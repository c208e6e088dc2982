//! Order submission and the staff report.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use krambam_core::catalog::resolve_zone;
use krambam_core::order::{Fulfillment, Order, RawOrder, ValidationErrors, compute_owed};
use krambam_core::page::Page;
use krambam_core::types::CustomerId;

use crate::db::orders::{OrderSummary, ProductTotal};
use crate::db::{CatalogRepository, OrderRepository};
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::state::AppState;

use super::PRODUCT_FILTER;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub customer_id: CustomerId,
}

/// `POST /api/krambambouli/order`
///
/// Validates the tagged payload, prices it against the catalog server-side
/// and persists the whole order in one transaction. Responds `201` with
/// the new customer id, `400` with per-field reasons, `500` on
/// infrastructure failure.
pub async fn submit_order(
    State(state): State<AppState>,
    Json(raw): Json<RawOrder>,
) -> Result<(StatusCode, Json<OrderCreated>)> {
    let order = Order::from_raw(raw)?;

    let catalog = CatalogRepository::new(state.pool());
    let products = catalog.list_products(Some(PRODUCT_FILTER)).await?;

    let delivery_fee = match &order.fulfillment {
        Fulfillment::PickUp { .. } => None,
        Fulfillment::Delivery { address } => {
            let zones = catalog.list_delivery_zones().await?;
            let zone = resolve_zone(&zones, address.post).ok_or_else(|| {
                ValidationErrors::single("post", "no delivery zone covers this postal code")
            })?;
            Some(zone.price)
        }
    };

    // The client's claimed total is advisory; the catalog decides.
    let owed = compute_owed(&order.items, &products, delivery_fee)
        .map_err(|e| ValidationErrors::single("orders", e.to_string()))?;
    if let Some(claimed) = order.claimed_owed
        && claimed != owed
    {
        tracing::warn!(%claimed, recomputed = %owed, "client-submitted total disagrees with catalog pricing");
    }

    let repo = OrderRepository::new(state.pool(), state.retry_attempts());
    let customer_id = match &order.fulfillment {
        Fulfillment::PickUp { location } => {
            repo.submit_pickup_order(&order.customer, *location, &order.items, owed)
                .await?
        }
        Fulfillment::Delivery { address } => {
            repo.submit_delivery_order(&order.customer, address, &order.items, owed)
                .await?
        }
    };

    tracing::info!(%customer_id, owed = %owed, option = order.fulfillment.label(), "order submitted");
    Ok((StatusCode::CREATED, Json(OrderCreated { customer_id })))
}

/// `GET /api/krambambouli/orders`
///
/// Aggregate ordered amount per product, for the fulfillment headcount.
pub async fn product_totals(State(state): State<AppState>) -> Result<Json<Vec<ProductTotal>>> {
    let repo = OrderRepository::new(state.pool(), state.retry_attempts());
    Ok(Json(repo.product_totals().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// `GET /api/krambambouli/orders/customers`
///
/// Staff-only paginated order report for payment/fulfillment
/// reconciliation.
pub async fn list_orders(
    RequireStaff(_claims): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Page<OrderSummary>>> {
    let repo = OrderRepository::new(state.pool(), state.retry_attempts());
    let page = repo
        .list_orders(
            query.start,
            query.end,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(20),
        )
        .await?;
    Ok(Json(page))
}
