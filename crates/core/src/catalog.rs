//! Catalog read model: products, pickup locations and delivery zones.
//!
//! Catalog data is seeded once per season and read-only from the order
//! subsystem's perspective. Delivery zones price an order by the postal
//! code of the customer's address: each zone covers one or more inclusive
//! postal-code ranges and charges a flat fee.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DeliveryZoneId, Money, PickupLocationId, ProductId};

/// A sellable product with its unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price: Money,
}

/// A location where customers can collect their order.
///
/// The flagship-event location (the Krambambouli cantus itself) is marked
/// with an explicit flag rather than a naming convention on the
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupLocation {
    pub id: PickupLocationId,
    pub description: String,
    pub flagship: bool,
}

/// An inclusive postal-code range covered by a delivery zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalRange {
    pub lower: u32,
    pub upper: u32,
}

impl PostalRange {
    /// Whether `postal_code` falls inside this range, bounds included.
    #[must_use]
    pub const fn contains(&self, postal_code: u32) -> bool {
        self.lower <= postal_code && postal_code <= self.upper
    }

    const fn overlaps(&self, other: &Self) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

/// A named delivery area with a flat fee and the postal codes it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: DeliveryZoneId,
    pub area: String,
    pub ranges: Vec<PostalRange>,
    pub price: Money,
}

/// Two delivery zones claim the same postal code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("delivery zones '{first}' and '{second}' have overlapping postal ranges")]
pub struct RangeOverlap {
    pub first: String,
    pub second: String,
}

/// Find the zone whose ranges contain `postal_code`.
///
/// First match wins; [`check_disjoint_ranges`] guarantees at load time that
/// at most one zone can match.
#[must_use]
pub fn resolve_zone(zones: &[DeliveryZone], postal_code: u32) -> Option<&DeliveryZone> {
    zones
        .iter()
        .find(|zone| zone.ranges.iter().any(|range| range.contains(postal_code)))
}

/// Verify that no postal code belongs to more than one zone.
///
/// Ranges are maintained by hand in the catalog; this runs whenever zones
/// are seeded or loaded so a data-entry mistake fails loudly instead of
/// silently picking whichever zone sorts first.
///
/// # Errors
///
/// Returns [`RangeOverlap`] naming the two offending zones.
pub fn check_disjoint_ranges(zones: &[DeliveryZone]) -> Result<(), RangeOverlap> {
    for (i, a) in zones.iter().enumerate() {
        for b in &zones[i + 1..] {
            for ra in &a.ranges {
                if b.ranges.iter().any(|rb| ra.overlaps(rb)) {
                    return Err(RangeOverlap {
                        first: a.area.clone(),
                        second: b.area.clone(),
                    });
                }
            }
        }
        // a zone's own ranges may touch; only cross-zone overlap is ambiguous
    }
    Ok(())
}
