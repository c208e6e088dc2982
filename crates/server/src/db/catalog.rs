//! Catalog repository: products, pickup locations, delivery zones.
//!
//! All catalog tables are read-only from the order subsystem's point of
//! view; they are seeded via the CLI. Delivery zones come back with their
//! postal-code ranges aggregated (one zone, N ranges) and are checked for
//! cross-zone overlap every time they are loaded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use krambam_core::catalog::{
    self, DeliveryZone, PickupLocation, PostalRange, Product,
};
use krambam_core::types::{DeliveryZoneId, Money, PickupLocationId, ProductId};

use super::RepositoryError;

/// An association activity; the flagship one is the Krambambouli cantus
/// whose date gates the pickup and delivery windows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i32,
    pub name: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    euros: i64,
    cents: i32,
}

#[derive(sqlx::FromRow)]
struct PickupLocationRow {
    id: i32,
    description: String,
    flagship: bool,
}

#[derive(sqlx::FromRow)]
struct ZoneRangeRow {
    id: i32,
    area: String,
    euros: i64,
    cents: i32,
    lower: i32,
    upper: i32,
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: i32,
    name: String,
    location: String,
    description: Option<String>,
    date: DateTime<Utc>,
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products whose name matches `filter` (case-insensitive), or the
    /// whole catalog when no filter is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if a stored price is out of range.
    pub async fn list_products(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, description, image_url, euros, cents
            FROM products
            WHERE $1::text IS NULL OR name ILIKE '%' || $1 || '%'
            ORDER BY id
            ",
        )
        .bind(filter)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Product {
                    id: ProductId::new(row.id),
                    name: row.name,
                    description: row.description,
                    image_url: row.image_url,
                    price: money_from_db(row.euros, row.cents)?,
                })
            })
            .collect()
    }

    /// List the currently active pickup locations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pickup_locations(&self) -> Result<Vec<PickupLocation>, RepositoryError> {
        let rows: Vec<PickupLocationRow> = sqlx::query_as(
            r"
            SELECT id, description, flagship
            FROM pickup_locations
            WHERE active = TRUE
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PickupLocation {
                id: PickupLocationId::new(row.id),
                description: row.description,
                flagship: row.flagship,
            })
            .collect())
    }

    /// List every delivery zone with its postal ranges aggregated.
    ///
    /// Cross-zone range overlap is a catalog data error and is rejected
    /// here rather than silently resolved by table order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure and
    /// `DataCorruption` for out-of-range prices, negative postal bounds or
    /// overlapping ranges.
    pub async fn list_delivery_zones(&self) -> Result<Vec<DeliveryZone>, RepositoryError> {
        let rows: Vec<ZoneRangeRow> = sqlx::query_as(
            r"
            SELECT dl.id, dl.area, dl.euros, dl.cents, lc.lower, lc.upper
            FROM delivery_locations dl
            JOIN location_codes lc ON lc.location_id = dl.id
            ORDER BY dl.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let mut zones: Vec<DeliveryZone> = Vec::new();
        for row in rows {
            let range = PostalRange {
                lower: postal_from_db(row.lower)?,
                upper: postal_from_db(row.upper)?,
            };
            match zones.last_mut() {
                Some(zone) if zone.id.as_i32() == row.id => zone.ranges.push(range),
                _ => zones.push(DeliveryZone {
                    id: DeliveryZoneId::new(row.id),
                    area: row.area,
                    ranges: vec![range],
                    price: money_from_db(row.euros, row.cents)?,
                }),
            }
        }

        catalog::check_disjoint_ranges(&zones)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(zones)
    }

    /// The flagship activity (the Krambambouli cantus), if one is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn flagship_activity(&self) -> Result<Option<Activity>, RepositoryError> {
        let row: Option<ActivityRow> = sqlx::query_as(
            r"
            SELECT id, name, location, description, date
            FROM activities
            WHERE flagship = TRUE
            ORDER BY date
            LIMIT 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|row| Activity {
            id: row.id,
            name: row.name,
            location: row.location,
            description: row.description,
            date: row.date,
        }))
    }
}

/// Rebuild a [`Money`] from its two stored columns.
pub(crate) fn money_from_db(euros: i64, cents: i32) -> Result<Money, RepositoryError> {
    let euros = u64::try_from(euros)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative euros: {euros}")))?;
    let cents = u64::try_from(cents)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative cents: {cents}")))?;
    Ok(Money::new(euros, cents))
}

fn postal_from_db(code: i32) -> Result<u32, RepositoryError> {
    u32::try_from(code)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative postal code: {code}")))
}
