//! Staff toggles for the paid and fulfilled flags.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use krambam_core::types::CustomerId;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePayment {
    pub customer_id: CustomerId,
    pub paid: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFulfilled {
    pub customer_id: CustomerId,
    pub fulfilled: bool,
}

/// `PUT /api/krambambouli/toggle-payment`
///
/// Sets the paid flag to exactly the submitted value and echoes it back.
/// `404` when the customer id does not exist.
pub async fn toggle_payment(
    RequireStaff(claims): RequireStaff,
    State(state): State<AppState>,
    Json(body): Json<TogglePayment>,
) -> Result<Json<bool>> {
    let repo = OrderRepository::new(state.pool(), state.retry_attempts());
    let paid = repo.set_paid(body.customer_id, body.paid).await?;
    tracing::info!(staff = %claims.sub, customer = %body.customer_id, paid, "payment flag set");
    Ok(Json(paid))
}

/// `PUT /api/krambambouli/toggle-fulfilled`
pub async fn toggle_fulfilled(
    RequireStaff(claims): RequireStaff,
    State(state): State<AppState>,
    Json(body): Json<ToggleFulfilled>,
) -> Result<Json<bool>> {
    let repo = OrderRepository::new(state.pool(), state.retry_attempts());
    let fulfilled = repo.set_fulfilled(body.customer_id, body.fulfilled).await?;
    tracing::info!(staff = %claims.sub, customer = %body.customer_id, fulfilled, "fulfilled flag set");
    Ok(Json(fulfilled))
}
