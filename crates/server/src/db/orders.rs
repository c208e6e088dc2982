//! Order repository: the transactional writer, the staff toggles and the
//! paginated order report.
//!
//! An order submission is one atomic transaction: the customer row, exactly
//! one fulfillment-path row (pickup link or delivery address) and every
//! positive line item either all land or none do. Transient connection
//! failures retry the whole transaction with a fixed delay; constraint
//! violations roll back and propagate immediately.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use sqlx::PgPool;

use krambam_core::order::{CustomerDetails, DeliveryAddress, LineItem};
use krambam_core::page::Page;
use krambam_core::types::{CustomerId, Money, PickupLocationId, ProductId};

use super::catalog::money_from_db;
use super::{RepositoryError, with_retry};

/// Aggregate ordered amount for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTotal {
    pub product_id: ProductId,
    pub total: u64,
}

/// A delivery address as it appears in the order report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAddress {
    pub street_name: String,
    pub house_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus: Option<String>,
    pub post: u32,
    pub city: String,
}

/// One customer's order, joined across its fulfillment path and line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub delivery_option: String,
    pub owed: Money,
    pub paid: bool,
    pub fulfilled: bool,
    pub created_at: DateTime<Utc>,
    /// Set for pickup orders; mutually exclusive with `address`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_description: Option<String>,
    /// Set for delivery orders; mutually exclusive with `pickup_description`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<ReportAddress>,
    pub orders: Vec<LineItem>,
}

enum FulfillmentRef<'f> {
    PickUp(PickupLocationId),
    Delivery(&'f DeliveryAddress),
}

impl FulfillmentRef<'_> {
    const fn label(&self) -> &'static str {
        match self {
            Self::PickUp(_) => krambam_core::order::DELIVERY_OPTION_PICK_UP,
            Self::Delivery(_) => krambam_core::order::DELIVERY_OPTION_DELIVERY,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderReportRow {
    customer_id: i32,
    first_name: String,
    last_name: String,
    email: String,
    delivery_option: String,
    owed_euros: i64,
    owed_cents: i32,
    paid: bool,
    fulfilled: bool,
    created_at: DateTime<Utc>,
    pickup_description: Option<String>,
    street_name: Option<String>,
    house_number: Option<i32>,
    bus: Option<String>,
    post: Option<i32>,
    city: Option<String>,
    product_id: Option<i32>,
    amount: Option<i32>,
}

const REPORT_PAGE_SQL: &str = r"
    SELECT
        c.id AS customer_id,
        c.first_name, c.last_name, c.email, c.delivery_option,
        c.owed_euros, c.owed_cents, c.paid, c.fulfilled, c.created_at,
        pl.description AS pickup_description,
        d.street_name, d.house_number, d.bus, d.post, d.city,
        o.product_id, o.amount
    FROM (
        SELECT * FROM krambambouli_customers
        WHERE created_at >= $1 AND created_at < $2
        ORDER BY created_at, id
        LIMIT $3 OFFSET $4
    ) c
    LEFT JOIN krambambouli_pickup_locations pjt ON pjt.customer_id = c.id
    LEFT JOIN pickup_locations pl ON pl.id = pjt.pickup_location_id
    LEFT JOIN krambambouli_delivery_addresses d ON d.customer_id = c.id
    LEFT JOIN krambambouli_orders o ON o.customer_id = c.id
    ORDER BY c.created_at, c.id
";

const REPORT_COUNT_SQL: &str = r"
    SELECT COUNT(*) FROM krambambouli_customers
    WHERE created_at >= $1 AND created_at < $2
";

/// Repository for order writes and the staff report.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
    retry_attempts: u32,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, retry_attempts: u32) -> Self {
        Self {
            pool,
            retry_attempts,
        }
    }

    /// Persist a pickup order atomically and return the new customer id.
    ///
    /// # Errors
    ///
    /// `Conflict` for constraint violations (unknown product or pickup
    /// location), `Database` once the transient-retry budget is exhausted.
    pub async fn submit_pickup_order(
        &self,
        customer: &CustomerDetails,
        location: PickupLocationId,
        items: &[LineItem],
        owed: Money,
    ) -> Result<CustomerId, RepositoryError> {
        self.submit(customer, FulfillmentRef::PickUp(location), items, owed)
            .await
    }

    /// Persist a delivery order atomically and return the new customer id.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::submit_pickup_order`].
    pub async fn submit_delivery_order(
        &self,
        customer: &CustomerDetails,
        address: &DeliveryAddress,
        items: &[LineItem],
        owed: Money,
    ) -> Result<CustomerId, RepositoryError> {
        self.submit(customer, FulfillmentRef::Delivery(address), items, owed)
            .await
    }

    async fn submit(
        &self,
        customer: &CustomerDetails,
        fulfillment: FulfillmentRef<'_>,
        items: &[LineItem],
        owed: Money,
    ) -> Result<CustomerId, RepositoryError> {
        // Zero-amount entries are dropped, not stored; reject before any
        // database work if nothing positive remains.
        let (product_ids, amounts) = positive_items(items)?;

        let fulfillment = &fulfillment;
        let product_ids = &product_ids;
        let amounts = &amounts;
        with_retry(self.retry_attempts, move || {
            self.try_submit(customer, fulfillment, product_ids, amounts, owed)
        })
        .await
    }

    /// One attempt at the whole insert sequence, in one transaction.
    ///
    /// Dropping the transaction on any error path rolls everything back, so
    /// a dangling customer row is never observable.
    async fn try_submit(
        &self,
        customer: &CustomerDetails,
        fulfillment: &FulfillmentRef<'_>,
        product_ids: &[i32],
        amounts: &[i32],
        owed: Money,
    ) -> Result<CustomerId, RepositoryError> {
        let (owed_euros, owed_cents) = money_to_db(owed)?;
        let mut tx = self.pool.begin().await?;

        let id_row: Option<(i32,)> = sqlx::query_as(
            r"
            INSERT INTO krambambouli_customers
                (first_name, last_name, email, delivery_option, owed_euros, owed_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.email.as_str())
        .bind(fulfillment.label())
        .bind(owed_euros)
        .bind(owed_cents)
        .fetch_optional(&mut *tx)
        .await?;

        // Defensive: an insert that yields no id is a fatal internal error.
        let Some((customer_id,)) = id_row else {
            return Err(RepositoryError::DataCorruption(
                "customer insert returned no id".to_owned(),
            ));
        };

        match fulfillment {
            FulfillmentRef::PickUp(location) => {
                sqlx::query(
                    r"
                    INSERT INTO krambambouli_pickup_locations (customer_id, pickup_location_id)
                    VALUES ($1, $2)
                    ",
                )
                .bind(customer_id)
                .bind(location.as_i32())
                .execute(&mut *tx)
                .await
                .map_err(|e| classify_insert_error(e, "unknown pickup location"))?;
            }
            FulfillmentRef::Delivery(address) => {
                sqlx::query(
                    r"
                    INSERT INTO krambambouli_delivery_addresses
                        (customer_id, street_name, house_number, bus, post, city)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ",
                )
                .bind(customer_id)
                .bind(&address.street_name)
                .bind(postal_to_db(address.house_number, "house number")?)
                .bind(address.bus.as_deref())
                .bind(postal_to_db(address.post, "postal code")?)
                .bind(&address.city)
                .execute(&mut *tx)
                .await?;
            }
        }

        // All line items in a single multi-row insert, so they land (and
        // are awaited) together before the commit point.
        sqlx::query(
            r"
            INSERT INTO krambambouli_orders (customer_id, product_id, amount)
            SELECT $1, item.product_id, item.amount
            FROM UNNEST($2::int4[], $3::int4[]) AS item(product_id, amount)
            ",
        )
        .bind(customer_id)
        .bind(product_ids)
        .bind(amounts)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_insert_error(e, "unknown product id"))?;

        tx.commit().await?;
        Ok(CustomerId::new(customer_id))
    }

    /// Mark an order's payment state. Idempotent; echoes the new value.
    ///
    /// # Errors
    ///
    /// `NotFound` if no customer has that id.
    pub async fn set_paid(&self, id: CustomerId, paid: bool) -> Result<bool, RepositoryError> {
        self.toggle("UPDATE krambambouli_customers SET paid = $1 WHERE id = $2", id, paid)
            .await
    }

    /// Mark an order's fulfillment state. Idempotent; echoes the new value.
    ///
    /// # Errors
    ///
    /// `NotFound` if no customer has that id.
    pub async fn set_fulfilled(
        &self,
        id: CustomerId,
        fulfilled: bool,
    ) -> Result<bool, RepositoryError> {
        self.toggle(
            "UPDATE krambambouli_customers SET fulfilled = $1 WHERE id = $2",
            id,
            fulfilled,
        )
        .await
    }

    async fn toggle(
        &self,
        sql: &str,
        id: CustomerId,
        value: bool,
    ) -> Result<bool, RepositoryError> {
        with_retry(self.retry_attempts, move || async move {
            let result = sqlx::query(sql)
                .bind(value)
                .bind(id.as_i32())
                .execute(self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(value)
        })
        .await
    }

    /// Aggregate ordered amount per product, over all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_totals(&self) -> Result<Vec<ProductTotal>, RepositoryError> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            r"
            SELECT product_id, COALESCE(SUM(amount), 0)
            FROM krambambouli_orders
            GROUP BY product_id
            ORDER BY product_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(product_id, total)| {
                Ok(ProductTotal {
                    product_id: ProductId::new(product_id),
                    total: u64::try_from(total).map_err(|_| {
                        RepositoryError::DataCorruption(format!("negative amount sum: {total}"))
                    })?,
                })
            })
            .collect()
    }

    /// Paginated, date-filtered order report.
    ///
    /// Defaults to the current calendar year when no range is given;
    /// swapped bounds are normalized rather than rejected. The COUNT query
    /// runs concurrently with the page fetch. Customers with no line items
    /// still appear, with an empty `orders` list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_orders(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        page: u32,
        page_size: u32,
    ) -> Result<Page<OrderSummary>, RepositoryError> {
        let (start, end) = normalize_window(start, end, Utc::now());
        let page = page.max(1);
        let limit = i64::from(page_size);
        let offset = i64::from(page - 1) * limit;

        let (rows, (total,)): (Vec<OrderReportRow>, (i64,)) = tokio::try_join!(
            sqlx::query_as(REPORT_PAGE_SQL)
                .bind(start)
                .bind(end)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool),
            sqlx::query_as(REPORT_COUNT_SQL)
                .bind(start)
                .bind(end)
                .fetch_one(self.pool),
        )?;

        let mut content: Vec<OrderSummary> = Vec::new();
        for row in rows {
            let item = match (row.product_id, row.amount) {
                (Some(product_id), Some(amount)) => Some(LineItem {
                    product_id: ProductId::new(product_id),
                    amount: non_negative(amount, "line item amount")?,
                }),
                _ => None,
            };

            match content.last_mut() {
                Some(last) if last.customer_id.as_i32() == row.customer_id => {
                    if let Some(item) = item {
                        last.orders.push(item);
                    }
                }
                _ => content.push(summary_from_row(row, item)?),
            }
        }

        Ok(Page {
            content,
            page,
            page_size,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}

fn summary_from_row(
    row: OrderReportRow,
    first_item: Option<LineItem>,
) -> Result<OrderSummary, RepositoryError> {
    let address = match (row.street_name, row.house_number, row.post, row.city) {
        (Some(street_name), Some(house_number), Some(post), Some(city)) => Some(ReportAddress {
            street_name,
            house_number: non_negative(house_number, "house number")?,
            bus: row.bus,
            post: non_negative(post, "postal code")?,
            city,
        }),
        _ => None,
    };

    Ok(OrderSummary {
        customer_id: CustomerId::new(row.customer_id),
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        delivery_option: row.delivery_option,
        owed: money_from_db(row.owed_euros, row.owed_cents)?,
        paid: row.paid,
        fulfilled: row.fulfilled,
        created_at: row.created_at,
        pickup_description: row.pickup_description,
        address,
        orders: first_item.into_iter().collect(),
    })
}

/// Resolve the report window: default to the current calendar year, swap
/// reversed bounds instead of erroring.
fn normalize_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start.unwrap_or_else(|| start_of_year(now.year(), now));
    let end = end.unwrap_or_else(|| start_of_year(start.year() + 1, now));
    if start > end { (end, start) } else { (start, end) }
}

fn start_of_year(year: i32, fallback: DateTime<Utc>) -> DateTime<Utc> {
    // Utc has no DST gaps; the fallback is never taken for a valid year.
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .earliest()
        .unwrap_or(fallback)
}

/// Keep only items with `amount > 0`, split into parallel bind arrays.
fn positive_items(items: &[LineItem]) -> Result<(Vec<i32>, Vec<i32>), RepositoryError> {
    let mut product_ids = Vec::with_capacity(items.len());
    let mut amounts = Vec::with_capacity(items.len());
    for item in items.iter().filter(|item| item.amount > 0) {
        product_ids.push(item.product_id.as_i32());
        amounts.push(i32::try_from(item.amount).map_err(|_| {
            RepositoryError::DataCorruption(format!("line item amount too large: {}", item.amount))
        })?);
    }
    if product_ids.is_empty() {
        return Err(RepositoryError::Conflict(
            "order has no line items with amount > 0".to_owned(),
        ));
    }
    Ok((product_ids, amounts))
}

fn money_to_db(money: Money) -> Result<(i64, i32), RepositoryError> {
    let euros = i64::try_from(money.euros()).map_err(|_| {
        RepositoryError::DataCorruption(format!("owed euros out of range: {}", money.euros()))
    })?;
    let cents = i32::try_from(money.cents()).map_err(|_| {
        RepositoryError::DataCorruption(format!("owed cents out of range: {}", money.cents()))
    })?;
    Ok((euros, cents))
}

fn postal_to_db(value: u32, what: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{what} out of range: {value}")))
}

fn non_negative(value: i32, what: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {what}: {value}")))
}

/// Map a foreign-key violation to a typed `Conflict`; everything else stays
/// a database error (and keeps its transient classification).
fn classify_insert_error(e: sqlx::Error, conflict_message: &str) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::Conflict(conflict_message.to_owned())
        }
        _ => RepositoryError::Database(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product_id: i32, amount: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(product_id),
            amount,
        }
    }

    #[test]
    fn positive_items_drops_zero_amounts() {
        let (ids, amounts) = positive_items(&[item(1, 3), item(2, 0), item(3, 1)]).unwrap();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(amounts, vec![3, 1]);
    }

    #[test]
    fn positive_items_rejects_an_effectively_empty_order() {
        let err = positive_items(&[item(1, 0), item(2, 0)]).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn window_defaults_to_the_current_calendar_year() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let (start, end) = normalize_window(None, None, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_end_defaults_to_the_start_years_end() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
        let (s, e) = normalize_window(Some(start), None, now);
        assert_eq!(s, start);
        assert_eq!(e, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn reversed_window_bounds_are_swapped() {
        let now = Utc::now();
        let a = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(normalize_window(Some(b), Some(a), now), (a, b));
    }

    #[test]
    fn money_roundtrips_through_db_columns() {
        let (euros, cents) = money_to_db(Money::new(7, 50)).unwrap();
        assert_eq!((euros, cents), (7, 50));
        assert_eq!(money_from_db(euros, cents).unwrap(), Money::new(7, 50));
    }
}
