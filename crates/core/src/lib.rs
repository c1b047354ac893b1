#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Instasports booking storefront.
//!
//! This crate hosts the catalog models and location filter, the cart,
//! the booking flow with its timers, and configuration handling used by
//! the terminal UI and any future frontends.

pub mod booking;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod driver;
pub mod models;
pub mod storefront;

pub use booking::{BookingFlow, BookingRejection, BookingState, SubmitOutcome};
pub use cart::{Cart, CartItem, PricingError};
pub use catalog::{Catalog, CatalogLoader, CatalogSource, LocationFilter};
pub use config::AppConfig;
pub use driver::{BookingDriver, BookingEvent, BookingTimings};
pub use models::{Listing, ListingKind};
pub use storefront::{AddError, Storefront};
