//! Storefront core
//!
//! Catalog, cart and order services for a variant-based storefront: category
//! attribute schemas, cartesian variant generation, combination-keyed product
//! images, filterable catalog queries and transactional checkout.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod media;
pub mod migrator;
pub mod models;
pub mod services;

pub use errors::ServiceError;
