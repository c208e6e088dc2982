//! Krambam Core - Shared domain types.
//!
//! This crate provides the domain model used across the Krambambouli
//! pre-order service:
//! - `server` - Public order API + staff reconciliation endpoints
//! - `cli` - Command-line tools for migrations, seeding and staff accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Everything here is synchronous and fully unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Money, email and typed ID wrappers
//! - [`catalog`] - Products, pickup locations and delivery zones
//! - [`order`] - The tagged order shape and its boundary validation
//! - [`page`] - Pagination envelope for report queries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod order;
pub mod page;
pub mod types;

pub use catalog::{DeliveryZone, PickupLocation, PostalRange, Product};
pub use order::{
    CustomerDetails, DeliveryAddress, Fulfillment, LineItem, Order, ValidationErrors,
};
pub use page::Page;
pub use types::*;
