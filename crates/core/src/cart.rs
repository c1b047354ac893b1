//! Cart lines and the cart manager.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Listing, ListingKind};

/// Failure to price a listing for the cart.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Duration text did not parse as a positive number of hours.
    #[error("invalid duration '{0}', expected a positive number of hours")]
    InvalidDuration(String),
}

/// Parse hour text such as `"2"` or `"1.5"`.
pub fn parse_hours(duration: &str) -> Result<f64, PricingError> {
    let trimmed = duration.trim();
    match trimmed.parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours > 0.0 => Ok(hours),
        _ => Err(PricingError::InvalidDuration(trimmed.to_string())),
    }
}

/// Compute the line price for a listing of the given kind.
///
/// Equipment is session based and ignores the duration entirely.
pub fn line_price(listing: &Listing, kind: ListingKind, duration: &str) -> Result<f64, PricingError> {
    if kind.is_hourly() {
        Ok(listing.price * parse_hours(duration)?)
    } else {
        Ok(listing.price)
    }
}

/// A listing selected for booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// The catalog entry that was added.
    #[serde(flatten)]
    pub listing: Listing,
    /// Catalog category of the listing.
    #[serde(rename = "type")]
    pub kind: ListingKind,
    /// Booked hours as decimal text; ignored for equipment.
    pub duration: String,
    /// Price of one unit of this line.
    pub total_price: f64,
    /// Number of times the line was added. Absent means one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl CartItem {
    /// Build a cart line, computing its total price from the duration.
    pub fn new(
        listing: Listing,
        kind: ListingKind,
        duration: impl Into<String>,
    ) -> Result<Self, PricingError> {
        let duration = duration.into();
        let total_price = line_price(&listing, kind, &duration)?;
        Ok(Self {
            listing,
            kind,
            duration,
            total_price,
            quantity: Some(1),
        })
    }

    /// Identifier of the underlying listing.
    pub fn id(&self) -> &str {
        &self.listing.id
    }

    /// Quantity with the absent-means-one default applied.
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    /// Price of the whole line.
    pub fn subtotal(&self) -> f64 {
        self.total_price * f64::from(self.quantity())
    }
}

/// Ordered cart, unique by listing id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, or bump the quantity of the existing line with the same id.
    ///
    /// A re-add keeps every other field of the existing line, including its price.
    pub fn add(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|line| line.id() == item.id()) {
            existing.quantity = Some(existing.quantity() + 1);
            return;
        }
        self.items.push(CartItem {
            quantity: Some(1),
            ..item
        });
    }

    /// Remove the line with the given id. Returns whether a line was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.id() != id);
        self.items.len() != before
    }

    /// Sum of every line's price times its quantity.
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Sum of quantities, as shown on the cart badge.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(CartItem::quantity).sum()
    }

    /// Cart lines in insertion order.
    pub fn entries(&self) -> &[CartItem] {
        &self.items
    }

    /// Line with the given id.
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|line| line.id() == id)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
