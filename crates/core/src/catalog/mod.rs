//! Catalog data and location filtering.

/// Location selector and memoized filtered views.
pub mod filter;
/// Catalog loading from the embedded data set or a JSON file.
pub mod loader;

use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::{Founder, Listing, ListingKind, SafetyInfo, Testimonial};

pub use filter::{filter_listings, CatalogView, LocationFilter};
pub use loader::{CatalogLoader, CatalogSource};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json(BUILTIN_CATALOG).unwrap_or_else(|err| {
        tracing::error!(?err, "Embedded catalog is invalid");
        Catalog::default()
    })
});

/// Full inventory plus display-only content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Sports grounds.
    #[serde(default)]
    pub grounds: Vec<Listing>,
    /// Rental equipment.
    #[serde(default)]
    pub equipment: Vec<Listing>,
    /// Coaches.
    #[serde(default)]
    pub coaches: Vec<Listing>,
    /// Founder profiles.
    #[serde(default)]
    pub founders: Vec<Founder>,
    /// Customer testimonials.
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    /// Safety notice content.
    #[serde(default)]
    pub safety: SafetyInfo,
}

impl Catalog {
    /// The data set compiled into the binary.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("failed to parse catalog JSON")
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse catalog {}", path.display()))
    }

    /// Full inventory for a kind.
    pub fn listings(&self, kind: ListingKind) -> &[Listing] {
        match kind {
            ListingKind::Ground => &self.grounds,
            ListingKind::Equipment => &self.equipment,
            ListingKind::Coach => &self.coaches,
        }
    }

    /// Look up a listing by id within a kind.
    pub fn find(&self, kind: ListingKind, id: &str) -> Option<&Listing> {
        self.listings(kind).iter().find(|listing| listing.id == id)
    }

    /// Distinct location tags of location-bound listings, in first-seen
    /// order (grounds, then coaches).
    pub fn locations(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.grounds
            .iter()
            .chain(self.coaches.iter())
            .map(|listing| listing.location.trim().to_lowercase())
            .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
            .collect()
    }

    /// Total number of listings across kinds.
    pub fn len(&self) -> usize {
        self.grounds.len() + self.equipment.len() + self.coaches.len()
    }

    /// Whether the catalog has no listings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() -> Result<()> {
        let catalog = Catalog::from_json(BUILTIN_CATALOG)?;
        assert!(!catalog.grounds.is_empty());
        assert!(!catalog.equipment.is_empty());
        assert!(!catalog.coaches.is_empty());
        assert!(!catalog.founders.is_empty());
        assert!(!catalog.testimonials.is_empty());
        assert!(!catalog.safety.contacts.is_empty());
        assert_eq!(Catalog::builtin(), &catalog);
        Ok(())
    }

    #[test]
    fn builtin_ids_are_unique_per_kind() {
        let catalog = Catalog::builtin();
        for kind in ListingKind::ALL {
            let ids: BTreeSet<&str> = catalog
                .listings(kind)
                .iter()
                .map(|listing| listing.id.as_str())
                .collect();
            assert_eq!(ids.len(), catalog.listings(kind).len(), "duplicate id in {kind}");
        }
    }

    #[test]
    fn locations_cover_grounds_and_coaches() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.locations(), vec!["mumbai", "delhi", "hyderabad"]);
        assert!(catalog.find(ListingKind::Ground, "g1").is_some());
        assert!(catalog.find(ListingKind::Coach, "g1").is_none());
    }

    #[test]
    fn locations_keep_first_seen_order_without_duplicates() -> Result<()> {
        let catalog = Catalog::from_json(
            r#"{
                "grounds": [
                    {"id": "g1", "title": "A", "price": 1, "location": "pune"},
                    {"id": "g2", "title": "B", "price": 1, "location": "Chennai"},
                    {"id": "g3", "title": "C", "price": 1, "location": "pune"}
                ],
                "coaches": [
                    {"id": "c1", "title": "D", "price": 1, "location": "agra"},
                    {"id": "c2", "title": "E", "price": 1, "location": "chennai"}
                ]
            }"#,
        )?;
        assert_eq!(catalog.locations(), vec!["pune", "chennai", "agra"]);
        Ok(())
    }
}
