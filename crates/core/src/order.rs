//! The order shape and its boundary validation.
//!
//! A submitted order is a tagged union on `deliveryOption`: a pickup order
//! names a pickup location, a delivery order carries a full address. The
//! raw payload is validated exactly once at the HTTP boundary and turned
//! into the closed [`Order`] type; everything downstream (pricing,
//! persistence, reporting) works on that type and never re-checks fields.
//!
//! Validation is accumulating: every violated field is reported, not just
//! the first, so the order form can surface all problems at once. Free-text
//! fields are stripped of HTML before they leave this module, since the
//! values are later rendered on the staff dashboard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{Email, Money, PickupLocationId, ProductId};

/// Wire label for orders collected at a pickup location.
pub const DELIVERY_OPTION_PICK_UP: &str = "pick up";
/// Wire label for orders shipped to a customer address.
pub const DELIVERY_OPTION_DELIVERY: &str = "delivery";

/// One violated field in a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field violation found in one submitted payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// A single-field violation, for checks made outside the parser
    /// (e.g. an unknown product id or an uncovered postal code).
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The individual field violations.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
            first = false;
        }
        Ok(())
    }
}

/// The untyped order payload as it arrives on the wire.
///
/// Every field is optional so that validation can report all missing or
/// invalid fields together instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub delivery_option: Option<String>,
    /// Client-computed total; advisory only, recomputed server-side.
    pub owed: Option<Money>,
    pub orders: Option<Vec<RawLineItem>>,
    // pick-up variant
    pub pickup_location: Option<i64>,
    // delivery variant
    pub street_name: Option<String>,
    pub street_number: Option<i64>,
    pub bus: Option<String>,
    pub post: Option<i64>,
    pub city: Option<String>,
}

/// An unvalidated `(product, quantity)` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineItem {
    pub product_id: Option<i64>,
    pub amount: Option<i64>,
}

/// Validated customer identity fields shared by both order variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

/// A validated delivery address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAddress {
    pub street_name: String,
    pub house_number: u32,
    pub bus: Option<String>,
    pub post: u32,
    pub city: String,
}

/// How the order reaches the customer: exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fulfillment {
    PickUp { location: PickupLocationId },
    Delivery { address: DeliveryAddress },
}

impl Fulfillment {
    /// The wire label stored in the customer row's `delivery_option` column.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::PickUp { .. } => DELIVERY_OPTION_PICK_UP,
            Self::Delivery { .. } => DELIVERY_OPTION_DELIVERY,
        }
    }
}

/// A validated `(product, quantity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub amount: u32,
}

/// A fully validated order, ready for pricing and persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub customer: CustomerDetails,
    pub fulfillment: Fulfillment,
    /// Items as submitted; zero-amount entries are dropped at write time.
    pub items: Vec<LineItem>,
    /// The client's claimed total, kept only to cross-check server pricing.
    pub claimed_owed: Option<Money>,
}

impl Order {
    /// Validate a raw payload into a closed [`Order`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every violated field. A payload
    /// that fails here has produced no side effects.
    pub fn from_raw(raw: RawOrder) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let first_name = required_text(raw.first_name.as_deref(), "firstName", &mut errors);
        let last_name = required_text(raw.last_name.as_deref(), "lastName", &mut errors);

        let email = match raw.email.as_deref().map(sanitize) {
            None => {
                errors.push("email", "is required");
                None
            }
            Some(value) => match Email::parse(&value) {
                Ok(email) => Some(email),
                Err(e) => {
                    errors.push("email", e.to_string());
                    None
                }
            },
        };

        let fulfillment = validate_fulfillment(&raw, &mut errors);
        let items = validate_items(raw.orders.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        // All collectors only return None after recording an error.
        match (first_name, last_name, email, fulfillment, items) {
            (Some(first_name), Some(last_name), Some(email), Some(fulfillment), Some(items)) => {
                Ok(Self {
                    customer: CustomerDetails {
                        first_name,
                        last_name,
                        email,
                    },
                    fulfillment,
                    items,
                    claimed_owed: raw.owed,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required_text(
    value: Option<&str>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match value.map(sanitize) {
        Some(text) if !text.is_empty() => Some(text),
        Some(_) => {
            errors.push(field, "cannot be the empty string");
            None
        }
        None => {
            errors.push(field, "is required");
            None
        }
    }
}

fn validate_fulfillment(raw: &RawOrder, errors: &mut ValidationErrors) -> Option<Fulfillment> {
    match raw.delivery_option.as_deref() {
        Some(DELIVERY_OPTION_PICK_UP) => {
            if raw.street_name.is_some()
                || raw.street_number.is_some()
                || raw.bus.is_some()
                || raw.post.is_some()
                || raw.city.is_some()
            {
                errors.push(
                    "deliveryOption",
                    "pick up orders must not carry delivery address fields",
                );
                return None;
            }
            match raw.pickup_location.map(i32::try_from) {
                Some(Ok(id)) if id >= 0 => Some(Fulfillment::PickUp {
                    location: PickupLocationId::new(id),
                }),
                Some(_) => {
                    errors.push("pickupLocation", "must be a non-negative integer");
                    None
                }
                None => {
                    errors.push("pickupLocation", "is required for pick up orders");
                    None
                }
            }
        }
        Some(DELIVERY_OPTION_DELIVERY) => {
            let street_name = required_text(raw.street_name.as_deref(), "streetName", errors);
            let city = required_text(raw.city.as_deref(), "city", errors);

            let house_number = match raw.street_number {
                Some(n) if n >= 1 => u32::try_from(n).ok(),
                Some(_) => None,
                None => None,
            };
            if house_number.is_none() {
                errors.push("streetNumber", "must be a positive number");
            }

            let post = match raw.post {
                Some(p) if p >= 0 => u32::try_from(p).ok(),
                _ => None,
            };
            if post.is_none() {
                errors.push("post", "must be a non-negative integer");
            }

            let bus = raw
                .bus
                .as_deref()
                .map(sanitize)
                .filter(|bus| !bus.is_empty());

            match (street_name, house_number, post, city) {
                (Some(street_name), Some(house_number), Some(post), Some(city)) => {
                    Some(Fulfillment::Delivery {
                        address: DeliveryAddress {
                            street_name,
                            house_number,
                            bus,
                            post,
                            city,
                        },
                    })
                }
                _ => None,
            }
        }
        Some(other) => {
            errors.push(
                "deliveryOption",
                format!("must be '{DELIVERY_OPTION_PICK_UP}' or '{DELIVERY_OPTION_DELIVERY}', got '{other}'"),
            );
            None
        }
        None => {
            errors.push("deliveryOption", "is required");
            None
        }
    }
}

fn validate_items(
    raw_items: Option<&[RawLineItem]>,
    errors: &mut ValidationErrors,
) -> Option<Vec<LineItem>> {
    let Some(raw_items) = raw_items else {
        errors.push("orders", "is required");
        return None;
    };

    let mut items = Vec::with_capacity(raw_items.len());
    let mut item_errors = false;
    for (idx, item) in raw_items.iter().enumerate() {
        let product_id = match item.product_id {
            Some(id) if id >= 0 => i32::try_from(id).ok().map(ProductId::new),
            _ => None,
        };
        if product_id.is_none() {
            errors.push(
                format!("orders[{idx}].productId"),
                "must be a non-negative integer",
            );
            item_errors = true;
        }

        let amount = match item.amount {
            Some(n) if n >= 0 => u32::try_from(n).ok(),
            _ => None,
        };
        if amount.is_none() {
            errors.push(
                format!("orders[{idx}].amount"),
                "must be a non-negative integer",
            );
            item_errors = true;
        }

        if let (Some(product_id), Some(amount)) = (product_id, amount) {
            items.push(LineItem { product_id, amount });
        }
    }

    if item_errors {
        return None;
    }
    if items.iter().all(|item| item.amount == 0) {
        errors.push("orders", "at least one line item must have an amount > 0");
        return None;
    }
    Some(items)
}

/// Strip HTML/script content from a free-text field.
///
/// Anything between `<` and `>` is dropped along with the brackets, and the
/// result is whitespace-trimmed. Values end up rendered on the staff
/// dashboard, so this runs server-side regardless of what the form did.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_owned()
}

/// The server-side price of an unknown product was requested.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown product id {0}")]
pub struct UnknownProduct(pub ProductId);

/// Recompute the amount owed from catalog prices.
///
/// Sums `amount * unit price` over the positive line items, plus the flat
/// `delivery_fee` for delivery orders. The client-submitted total is never
/// trusted; this is the value that gets persisted.
///
/// # Errors
///
/// Returns [`UnknownProduct`] if a line item references a product that is
/// not in the catalog.
pub fn compute_owed(
    items: &[LineItem],
    products: &[Product],
    delivery_fee: Option<Money>,
) -> Result<Money, UnknownProduct> {
    let mut total = delivery_fee.unwrap_or(Money::ZERO);
    for item in items.iter().filter(|item| item.amount > 0) {
        let product = products
            .iter()
            .find(|product| product.id == item.product_id)
            .ok_or(UnknownProduct(item.product_id))?;
        total = total + product.price * u64::from(item.amount);
    }
    Ok(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Money;

    fn pickup_payload() -> serde_json::Value {
        serde_json::json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane.doe@example.com",
            "deliveryOption": "pick up",
            "pickupLocation": 1,
            "owed": {"euros": 7, "cents": 50},
            "orders": [{"productId": 1, "amount": 3}]
        })
    }

    fn parse(value: serde_json::Value) -> Result<Order, ValidationErrors> {
        let raw: RawOrder = serde_json::from_value(value).unwrap();
        Order::from_raw(raw)
    }

    #[test]
    fn valid_pickup_order_parses() {
        let order = parse(pickup_payload()).unwrap();
        assert_eq!(order.customer.first_name, "Jane");
        assert_eq!(order.customer.email.as_str(), "jane.doe@example.com");
        assert_eq!(
            order.fulfillment,
            Fulfillment::PickUp {
                location: PickupLocationId::new(1)
            }
        );
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.claimed_owed, Some(Money::new(7, 50)));
    }

    #[test]
    fn valid_delivery_order_parses() {
        let order = parse(serde_json::json!({
            "firstName": "Jan",
            "lastName": "Peeters",
            "email": "jan@example.com",
            "deliveryOption": "delivery",
            "streetName": "Bondgenotenlaan",
            "streetNumber": 12,
            "bus": "B",
            "post": 3000,
            "city": "Leuven",
            "orders": [{"productId": 2, "amount": 1}]
        }))
        .unwrap();

        let Fulfillment::Delivery { address } = order.fulfillment else {
            panic!("expected delivery fulfillment");
        };
        assert_eq!(address.street_name, "Bondgenotenlaan");
        assert_eq!(address.house_number, 12);
        assert_eq!(address.bus.as_deref(), Some("B"));
        assert_eq!(address.post, 3000);
    }

    #[test]
    fn every_violated_field_is_reported() {
        let err = parse(serde_json::json!({
            "firstName": "",
            "email": "not-an-email",
            "deliveryOption": "delivery",
            "streetNumber": 0,
            "city": "Leuven",
            "orders": [{"productId": 1, "amount": 2}]
        }))
        .unwrap_err();

        let fields: Vec<&str> = err.fields().iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"lastName"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"streetName"));
        assert!(fields.contains(&"streetNumber"));
        assert!(fields.contains(&"post"));
    }

    #[test]
    fn pickup_order_forbids_delivery_fields() {
        let mut payload = pickup_payload();
        payload["streetName"] = serde_json::json!("Bondgenotenlaan");
        let err = parse(payload).unwrap_err();
        assert!(err.fields().iter().any(|e| e.field == "deliveryOption"));
    }

    #[test]
    fn pickup_order_forbids_every_delivery_field() {
        // Each address field on its own must trip the check, not only the
        // textual ones.
        for (field, value) in [
            ("streetName", serde_json::json!("Bondgenotenlaan")),
            ("streetNumber", serde_json::json!(12)),
            ("bus", serde_json::json!("B")),
            ("post", serde_json::json!(3000)),
            ("city", serde_json::json!("Leuven")),
        ] {
            let mut payload = pickup_payload();
            payload[field] = value;
            let err = parse(payload).unwrap_err();
            assert!(
                err.fields().iter().any(|e| e.field == "deliveryOption"),
                "pickup payload with '{field}' was not rejected"
            );
        }
    }

    #[test]
    fn missing_pickup_location_is_rejected() {
        let mut payload = pickup_payload();
        payload
            .as_object_mut()
            .unwrap()
            .remove("pickupLocation");
        let err = parse(payload).unwrap_err();
        assert!(err.fields().iter().any(|e| e.field == "pickupLocation"));
    }

    #[test]
    fn all_zero_amounts_are_rejected() {
        let mut payload = pickup_payload();
        payload["orders"] = serde_json::json!([
            {"productId": 1, "amount": 0},
            {"productId": 2, "amount": 0}
        ]);
        let err = parse(payload).unwrap_err();
        assert!(err.fields().iter().any(|e| e.field == "orders"));
    }

    #[test]
    fn missing_items_are_rejected() {
        let mut payload = pickup_payload();
        payload.as_object_mut().unwrap().remove("orders");
        let err = parse(payload).unwrap_err();
        assert!(err.fields().iter().any(|e| e.field == "orders"));
    }

    #[test]
    fn free_text_is_sanitized() {
        let mut payload = pickup_payload();
        payload["firstName"] = serde_json::json!("<script>alert(1)</script>Jane");
        let order = parse(payload).unwrap();
        assert_eq!(order.customer.first_name, "alert(1)Jane");
    }

    #[test]
    fn sanitize_strips_tags_and_trims() {
        assert_eq!(sanitize("  Jane "), "Jane");
        assert_eq!(sanitize("<b>Jane</b>"), "Jane");
        assert_eq!(sanitize("a < b"), "a");
        assert_eq!(sanitize("<img src=x onerror=alert(1)>"), "");
    }

    fn product(id: i32, price: Money) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Krambambouli {id}"),
            description: None,
            image_url: None,
            price,
        }
    }

    #[test]
    fn owed_is_the_sum_of_line_totals() {
        let products = vec![product(1, Money::new(2, 50)), product(2, Money::new(3, 0))];
        let items = vec![
            LineItem {
                product_id: ProductId::new(1),
                amount: 2,
            },
            LineItem {
                product_id: ProductId::new(2),
                amount: 1,
            },
        ];
        assert_eq!(
            compute_owed(&items, &products, None).unwrap(),
            Money::new(8, 0)
        );
    }

    #[test]
    fn delivery_fee_adds_exactly_the_zone_price() {
        let products = vec![product(1, Money::new(2, 50))];
        let items = vec![LineItem {
            product_id: ProductId::new(1),
            amount: 3,
        }];
        assert_eq!(
            compute_owed(&items, &products, Some(Money::new(5, 0))).unwrap(),
            Money::new(12, 50)
        );
    }

    #[test]
    fn zero_amount_items_do_not_price() {
        let products = vec![product(1, Money::new(2, 50))];
        let items = vec![
            LineItem {
                product_id: ProductId::new(1),
                amount: 3,
            },
            LineItem {
                // not in the catalog, but never priced at amount 0
                product_id: ProductId::new(99),
                amount: 0,
            },
        ];
        assert_eq!(
            compute_owed(&items, &products, None).unwrap(),
            Money::new(7, 50)
        );
    }

    #[test]
    fn unknown_product_is_an_error() {
        let err = compute_owed(
            &[LineItem {
                product_id: ProductId::new(42),
                amount: 1,
            }],
            &[],
            None,
        )
        .unwrap_err();
        assert_eq!(err, UnknownProduct(ProductId::new(42)));
    }
}
