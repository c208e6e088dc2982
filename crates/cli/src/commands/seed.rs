//! Catalog seeding for a new campaign year.
//!
//! Inserts the products, pickup locations, delivery zones and the flagship
//! cantus. Refuses to run against a catalog that already has products so a
//! stray invocation cannot duplicate the campaign.
//!
//! ```bash
//! krambam seed
//! ```

use krambam_server::db::CatalogRepository;

use super::{CliError, connect};

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    euros: i64,
    cents: i32,
}

struct SeedZone {
    area: &'static str,
    euros: i64,
    cents: i32,
    ranges: &'static [(i32, i32)],
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Krambambouli 75cl",
        description: "Huisgebrouwen krambambouli, grote fles",
        euros: 12,
        cents: 50,
    },
    SeedProduct {
        name: "Krambambouli 33cl",
        description: "Huisgebrouwen krambambouli, kleine fles",
        euros: 6,
        cents: 0,
    },
];

// (description, flagship)
const PICKUP_LOCATIONS: &[(&str, bool)] = &[
    ("Op de Krambambouli-cantus zelf", true),
    ("Fakbar Moeder Lambik, tijdens de permanentie", false),
];

// The flagship cantus; its date gates the pickup and delivery windows.
const CANTUS: (&str, &str, &str, &str) = (
    "Krambambouli-cantus",
    "Fakbar Moeder Lambik",
    "Jaarlijkse krambamboulicantus, afhaalmoment voor bestellingen",
    "2026-12-08T20:00:00+01:00",
);

const ZONES: &[SeedZone] = &[
    SeedZone {
        area: "Leuven centrum",
        euros: 1,
        cents: 0,
        ranges: &[(3000, 3012)],
    },
    SeedZone {
        area: "Rand rond Leuven",
        euros: 2,
        cents: 50,
        ranges: &[(3018, 3054)],
    },
];

/// Seed the catalog tables.
///
/// # Errors
///
/// Returns `CliError::InvalidInput` when the catalog already has products,
/// `CliError::Repository` when the seeded zones fail the disjointness
/// check, `CliError::Database` on any other failure.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        return Err(CliError::InvalidInput(format!(
            "catalog already has {existing} products; refusing to seed twice"
        )));
    }

    let mut tx = pool.begin().await?;

    for product in PRODUCTS {
        sqlx::query(
            r"
            INSERT INTO products (name, description, euros, cents)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(product.euros)
        .bind(product.cents)
        .execute(&mut *tx)
        .await?;
    }

    for (description, flagship) in PICKUP_LOCATIONS {
        sqlx::query("INSERT INTO pickup_locations (description, flagship) VALUES ($1, $2)")
            .bind(description)
            .bind(flagship)
            .execute(&mut *tx)
            .await?;
    }

    for zone in ZONES {
        let (zone_id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO delivery_locations (area, euros, cents)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(zone.area)
        .bind(zone.euros)
        .bind(zone.cents)
        .fetch_one(&mut *tx)
        .await?;

        for (lower, upper) in zone.ranges {
            sqlx::query(
                "INSERT INTO location_codes (location_id, lower, upper) VALUES ($1, $2, $3)",
            )
            .bind(zone_id)
            .bind(lower)
            .bind(upper)
            .execute(&mut *tx)
            .await?;
        }
    }

    let (name, location, description, date) = CANTUS;
    sqlx::query(
        r"
        INSERT INTO activities (name, location, description, date, flagship)
        VALUES ($1, $2, $3, $4::timestamptz, TRUE)
        ",
    )
    .bind(name)
    .bind(location)
    .bind(description)
    .bind(date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    // Round-trip through the repository so the disjointness check runs on
    // what actually landed.
    let zones = CatalogRepository::new(&pool).list_delivery_zones().await?;

    tracing::info!(
        products = PRODUCTS.len(),
        pickup_locations = PICKUP_LOCATIONS.len(),
        zones = zones.len(),
        "Catalog seeded"
    );
    Ok(())
}
