use std::{convert::Infallible, fmt, str::FromStr, sync::Arc};

use tracing::debug;

use crate::{
    catalog::Catalog,
    models::{Listing, ListingKind},
};

/// Location selector: every location, or a single city tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LocationFilter {
    /// No location restriction.
    #[default]
    All,
    /// Only listings tagged with this city (lowercase).
    City(String),
}

impl LocationFilter {
    /// Build a selector for a city tag.
    pub fn city(tag: impl AsRef<str>) -> Self {
        Self::City(tag.as_ref().trim().to_lowercase())
    }

    /// Whether a listing location passes the selector.
    pub fn matches(&self, location: &str) -> bool {
        match self {
            LocationFilter::All => true,
            LocationFilter::City(tag) => location.trim().to_lowercase() == *tag,
        }
    }

    /// Whether this is the `all` selector.
    pub fn is_all(&self) -> bool {
        matches!(self, LocationFilter::All)
    }

    /// Title-cased label for display.
    pub fn label(&self) -> String {
        match self {
            LocationFilter::All => "All Locations".to_string(),
            LocationFilter::City(tag) => {
                let mut chars = tag.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

impl FromStr for LocationFilter {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(LocationFilter::All)
        } else {
            Ok(LocationFilter::city(trimmed))
        }
    }
}

impl fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationFilter::All => f.write_str("all"),
            LocationFilter::City(tag) => f.write_str(tag),
        }
    }
}

/// Subset of `inventory` visible for `location`.
///
/// Equipment is location independent and always returned in full.
pub fn filter_listings(
    inventory: &[Listing],
    kind: ListingKind,
    location: &LocationFilter,
) -> Vec<Listing> {
    if !kind.is_location_bound() || location.is_all() {
        return inventory.to_vec();
    }
    inventory
        .iter()
        .filter(|listing| location.matches(&listing.location))
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
struct CachedView {
    revision: u64,
    location: LocationFilter,
    listings: Arc<[Listing]>,
}

/// Memoized filtered listings per kind.
///
/// A kind is recomputed only when the catalog revision or, for
/// location-bound kinds, the selector changed. Unchanged inputs hand
/// back the same `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    views: [Option<CachedView>; 3],
}

impl CatalogView {
    /// Create an empty view; every kind is computed on first refresh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring every kind up to date with the given inputs.
    pub fn refresh(&mut self, catalog: &Catalog, revision: u64, location: &LocationFilter) {
        for kind in ListingKind::ALL {
            self.listings(catalog, revision, kind, location);
        }
    }

    /// Filtered listings for a kind, recomputing only when inputs changed.
    pub fn listings(
        &mut self,
        catalog: &Catalog,
        revision: u64,
        kind: ListingKind,
        location: &LocationFilter,
    ) -> Arc<[Listing]> {
        let key = if kind.is_location_bound() {
            location.clone()
        } else {
            LocationFilter::All
        };
        let slot = &mut self.views[kind.index()];
        if let Some(cached) = slot.as_ref() {
            if cached.revision == revision && cached.location == key {
                return Arc::clone(&cached.listings);
            }
        }

        let listings: Arc<[Listing]> =
            Arc::from(filter_listings(catalog.listings(kind), kind, &key));
        debug!(%kind, location = %key, revision, count = listings.len(), "Recomputed listings");
        *slot = Some(CachedView {
            revision,
            location: key,
            listings: Arc::clone(&listings),
        });
        listings
    }

    /// Last computed listings for a kind, empty before the first refresh.
    pub fn cached(&self, kind: ListingKind) -> Arc<[Listing]> {
        self.views[kind.index()]
            .as_ref()
            .map(|cached| Arc::clone(&cached.listings))
            .unwrap_or_else(|| Arc::from(Vec::<Listing>::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().clone()
    }

    #[test]
    fn all_selector_returns_full_inventory() {
        let catalog = catalog();
        for kind in ListingKind::ALL {
            let visible = filter_listings(catalog.listings(kind), kind, &LocationFilter::All);
            assert_eq!(visible.as_slice(), catalog.listings(kind));
        }
    }

    #[test]
    fn city_selector_keeps_matching_locations_only() {
        let catalog = catalog();
        let delhi = LocationFilter::city("Delhi");
        for kind in [ListingKind::Ground, ListingKind::Coach] {
            let visible = filter_listings(catalog.listings(kind), kind, &delhi);
            assert!(!visible.is_empty());
            assert!(visible.iter().all(|listing| listing.location == "delhi"));
        }
    }

    #[test]
    fn equipment_ignores_location() {
        let catalog = catalog();
        let visible = filter_listings(
            catalog.listings(ListingKind::Equipment),
            ListingKind::Equipment,
            &LocationFilter::city("hyderabad"),
        );
        assert_eq!(visible.len(), catalog.equipment.len());
    }

    #[test]
    fn unknown_city_yields_empty_result() {
        let catalog = catalog();
        let visible = filter_listings(
            catalog.listings(ListingKind::Ground),
            ListingKind::Ground,
            &LocationFilter::city("pune"),
        );
        assert!(visible.is_empty());
    }

    #[test]
    fn selector_parses_from_text() {
        assert_eq!("all".parse::<LocationFilter>(), Ok(LocationFilter::All));
        assert_eq!(" ALL ".parse::<LocationFilter>(), Ok(LocationFilter::All));
        assert_eq!(
            "Mumbai".parse::<LocationFilter>(),
            Ok(LocationFilter::City("mumbai".to_string()))
        );
        assert_eq!(LocationFilter::city("mumbai").label(), "Mumbai");
        assert_eq!(LocationFilter::All.to_string(), "all");
    }

    #[test]
    fn city_matching_folds_unicode_case() {
        let evora = LocationFilter::city("ÉVORA");
        assert_eq!(evora, LocationFilter::City("évora".to_string()));
        assert!(evora.matches("Évora"));
        assert!(evora.matches(" ÉVORA "));
        assert!(!evora.matches("evora"));
        assert_eq!(evora.label(), "Évora");
    }

    #[test]
    fn view_is_stable_until_inputs_change() {
        let catalog = catalog();
        let mut view = CatalogView::new();
        let mumbai = LocationFilter::city("mumbai");

        let grounds = view.listings(&catalog, 0, ListingKind::Ground, &mumbai);
        let equipment = view.listings(&catalog, 0, ListingKind::Equipment, &mumbai);
        assert!(Arc::ptr_eq(
            &grounds,
            &view.listings(&catalog, 0, ListingKind::Ground, &mumbai)
        ));

        let delhi = LocationFilter::city("delhi");
        let moved = view.listings(&catalog, 0, ListingKind::Ground, &delhi);
        assert!(!Arc::ptr_eq(&grounds, &moved));
        assert!(Arc::ptr_eq(
            &equipment,
            &view.listings(&catalog, 0, ListingKind::Equipment, &delhi)
        ));

        let reloaded = view.listings(&catalog, 1, ListingKind::Equipment, &delhi);
        assert!(!Arc::ptr_eq(&equipment, &reloaded));
    }
}
