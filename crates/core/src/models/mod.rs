//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status value marking a ground as free to book.
pub const AVAILABLE_STATUS: &str = "Available";

/// A bookable or rentable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Stable identifier, unique within the catalog.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Short description (usually the venue address).
    #[serde(default)]
    pub description: String,
    /// Image URL used by graphical frontends.
    #[serde(default)]
    pub image: String,
    /// Free-form details text.
    #[serde(default)]
    pub details: String,
    /// Price per hour for grounds and coaches, per session for equipment.
    pub price: f64,
    /// City tag (e.g. `mumbai`).
    #[serde(default)]
    pub location: String,
    /// Free-form availability slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<String>>,
    /// Precomputed status (`Available` or anything else).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Rating between 0 and 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Whether the venue or coach passed safety verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_certified: Option<bool>,
}

impl Listing {
    /// Whether the precomputed status marks the listing as available.
    pub fn is_available(&self) -> bool {
        self.status.as_deref() == Some(AVAILABLE_STATUS)
    }

    /// Whether a listing of the given kind may be added to the cart.
    ///
    /// Only grounds carry a status; equipment and coaches are always addable.
    pub fn is_bookable(&self, kind: ListingKind) -> bool {
        match kind {
            ListingKind::Ground => self.is_available(),
            ListingKind::Equipment | ListingKind::Coach => true,
        }
    }

    /// Whether the listing carries the safety-certified badge.
    pub fn is_safety_certified(&self) -> bool {
        self.safety_certified.unwrap_or(false)
    }

    /// Description text with the location-independent fallback.
    pub fn description_or_default(&self) -> &str {
        if self.description.trim().is_empty() {
            "Available at all locations"
        } else {
            &self.description
        }
    }
}

/// Catalog category of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// Sports ground, billed per hour.
    Ground,
    /// Rental equipment, billed per session.
    Equipment,
    /// Coach, billed per hour.
    Coach,
}

impl ListingKind {
    /// All kinds in tab order.
    pub const ALL: [ListingKind; 3] = [
        ListingKind::Ground,
        ListingKind::Equipment,
        ListingKind::Coach,
    ];

    /// Heading used for the kind's tab.
    pub fn label(self) -> &'static str {
        match self {
            ListingKind::Ground => "Sports Grounds",
            ListingKind::Equipment => "Equipment Rental",
            ListingKind::Coach => "Certified Coaches",
        }
    }

    /// Unit appended to the listing price.
    pub fn price_unit(self) -> &'static str {
        match self {
            ListingKind::Equipment => "/session",
            ListingKind::Ground | ListingKind::Coach => "/hr",
        }
    }

    /// Label of the add-to-cart action.
    pub fn action_label(self) -> &'static str {
        match self {
            ListingKind::Ground => "Book Now",
            ListingKind::Equipment => "Rent Now",
            ListingKind::Coach => "Book Session",
        }
    }

    /// Whether the total price depends on the selected duration.
    pub fn is_hourly(self) -> bool {
        !matches!(self, ListingKind::Equipment)
    }

    /// Whether the kind is filtered by location.
    pub fn is_location_bound(self) -> bool {
        !matches!(self, ListingKind::Equipment)
    }

    /// Tab index of the kind.
    pub fn index(self) -> usize {
        match self {
            ListingKind::Ground => 0,
            ListingKind::Equipment => 1,
            ListingKind::Coach => 2,
        }
    }

    /// Next kind in tab order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListingKind::Ground => "ground",
            ListingKind::Equipment => "equipment",
            ListingKind::Coach => "coach",
        };
        f.write_str(name)
    }
}

/// Founder profile shown on the about screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Founder {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: String,
}

impl Founder {
    /// Initials built from the first letter of each name part.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }
}

/// Customer testimonial shown on the about screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Testimonial {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub image: String,
    pub rating: f64,
    pub review: String,
}

/// Emergency contact entry of the safety notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct EmergencyContact {
    pub label: String,
    pub number: String,
}

/// Safety notice content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[allow(missing_docs)]
pub struct SafetyInfo {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub contacts: Vec<EmergencyContact>,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Render a rating as five stars followed by the value with one decimal.
pub fn star_rating(rating: f64) -> String {
    let filled = rating.clamp(0.0, 5.0).floor() as usize;
    let mut stars = String::with_capacity(5 * 3 + 4);
    for idx in 0..5 {
        stars.push(if idx < filled { '★' } else { '☆' });
    }
    format!("{stars} {rating:.1}")
}

/// Format a price using the given currency symbol, dropping a zero fraction.
pub fn format_price(symbol: &str, value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{symbol}{value:.0}")
    } else {
        format!("{symbol}{value:.2}")
    }
}
