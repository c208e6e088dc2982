//! Krambam server library.
//!
//! The HTTP service behind the Krambambouli pre-order flow: public catalog
//! and order submission, staff login, and the staff-only reconciliation
//! endpoints (payment/fulfillment toggles, paginated order report).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
