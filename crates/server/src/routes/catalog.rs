//! Catalog read endpoints backing the order form.

use axum::Json;
use axum::extract::State;

use krambam_core::catalog::{DeliveryZone, PickupLocation, Product};

use crate::db::CatalogRepository;
use crate::db::catalog::Activity;
use crate::error::{AppError, Result};
use crate::state::AppState;

use super::PRODUCT_FILTER;

/// `GET /api/store/products/krambambouli`
pub async fn products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let repo = CatalogRepository::new(state.pool());
    Ok(Json(repo.list_products(Some(PRODUCT_FILTER)).await?))
}

/// `GET /api/krambambouli/pickup`
pub async fn pickup_locations(State(state): State<AppState>) -> Result<Json<Vec<PickupLocation>>> {
    let repo = CatalogRepository::new(state.pool());
    Ok(Json(repo.list_pickup_locations().await?))
}

/// `GET /api/krambambouli/delivery`
pub async fn delivery_zones(State(state): State<AppState>) -> Result<Json<Vec<DeliveryZone>>> {
    let repo = CatalogRepository::new(state.pool());
    Ok(Json(repo.list_delivery_zones().await?))
}

/// `GET /api/krambambouli/cantus`
///
/// The flagship cantus activity, or `404` when none is scheduled yet.
pub async fn cantus(State(state): State<AppState>) -> Result<Json<Activity>> {
    let repo = CatalogRepository::new(state.pool());
    let activity = repo
        .flagship_activity()
        .await?
        .ok_or_else(|| AppError::NotFound("cantus".to_owned()))?;
    Ok(Json(activity))
}
