//! Storefront session state.
//!
//! One owned struct holding location, duration, active tab, cart, selected
//! date and booking flow. Every user action maps to one method here; the
//! presentation layer only reads the accessors.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    booking::{AttemptId, BookingFlow, NoticeId, SubmitOutcome},
    cart::{parse_hours, Cart, CartItem, PricingError},
    catalog::{Catalog, CatalogView, LocationFilter},
    config::AppConfig,
    models::{Listing, ListingKind},
};

/// Hour options offered by the duration selector.
pub const DURATION_OPTIONS: [&str; 4] = ["1", "2", "3", "4"];

/// Failure to add a listing to the cart.
#[derive(Debug, Error, PartialEq)]
pub enum AddError {
    /// No visible listing with that id in the active tab.
    #[error("no {kind} listing '{id}' in the current view")]
    UnknownListing {
        /// Requested id.
        id: String,
        /// Active tab.
        kind: ListingKind,
    },
    /// The ground's status is not `Available`.
    #[error("{0} is already booked")]
    Unavailable(String),
    /// The selected duration could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Session state of the storefront.
#[derive(Debug)]
pub struct Storefront {
    catalog: Catalog,
    revision: u64,
    view: CatalogView,
    location: LocationFilter,
    duration: String,
    tab: ListingKind,
    cart: Cart,
    selected_date: Option<NaiveDate>,
    booking: BookingFlow,
}

impl Storefront {
    /// Fresh session over a catalog: all locations, one hour, grounds tab, empty cart.
    pub fn new(catalog: Catalog) -> Self {
        let mut store = Self {
            catalog,
            revision: 0,
            view: CatalogView::new(),
            location: LocationFilter::All,
            duration: DURATION_OPTIONS[0].to_string(),
            tab: ListingKind::Ground,
            cart: Cart::new(),
            selected_date: None,
            booking: BookingFlow::new(),
        };
        store.refresh_view();
        store
    }

    /// Fresh session with the configured startup selectors.
    pub fn with_config(catalog: Catalog, config: &AppConfig) -> Result<Self, PricingError> {
        let mut store = Self::new(catalog);
        store.set_location(config.location());
        store.set_duration(&config.default_duration)?;
        Ok(store)
    }

    /// Loaded catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Swap in a reloaded catalog; filtered views are recomputed.
    ///
    /// The cart keeps its lines since they carry their own listing copies.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.revision += 1;
        info!(revision = self.revision, listings = self.catalog.len(), "Catalog replaced");
        self.refresh_view();
    }

    /// Active location selector.
    pub fn location(&self) -> &LocationFilter {
        &self.location
    }

    /// Change the location selector.
    pub fn set_location(&mut self, location: LocationFilter) {
        if self.location == location {
            return;
        }
        debug!(location = %location, "Location changed");
        self.location = location;
        self.refresh_view();
    }

    /// Selectable locations: `all` followed by the catalog's city tags.
    pub fn location_options(&self) -> Vec<LocationFilter> {
        std::iter::once(LocationFilter::All)
            .chain(self.catalog.locations().into_iter().map(LocationFilter::City))
            .collect()
    }

    /// Advance to the next location option, wrapping around.
    pub fn cycle_location(&mut self) -> &LocationFilter {
        let options = self.location_options();
        let next = options
            .iter()
            .position(|option| option == &self.location)
            .map(|idx| (idx + 1) % options.len())
            .unwrap_or(0);
        let location = options.into_iter().nth(next).unwrap_or_default();
        self.set_location(location);
        &self.location
    }

    /// Selected duration in hours, as text.
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Change the duration used for newly added lines.
    pub fn set_duration(&mut self, duration: &str) -> Result<(), PricingError> {
        parse_hours(duration)?;
        self.duration = duration.trim().to_string();
        Ok(())
    }

    /// Advance to the next duration option, wrapping around.
    pub fn cycle_duration(&mut self) -> &str {
        let next = DURATION_OPTIONS
            .iter()
            .position(|option| *option == self.duration)
            .map(|idx| (idx + 1) % DURATION_OPTIONS.len())
            .unwrap_or(0);
        self.duration = DURATION_OPTIONS[next].to_string();
        &self.duration
    }

    /// Active tab.
    pub fn tab(&self) -> ListingKind {
        self.tab
    }

    /// Switch tab.
    pub fn set_tab(&mut self, tab: ListingKind) {
        self.tab = tab;
    }

    /// Switch to the next tab.
    pub fn next_tab(&mut self) -> ListingKind {
        self.tab = self.tab.next();
        self.tab
    }

    /// Filtered listings of the active tab.
    pub fn visible_listings(&self) -> Arc<[Listing]> {
        self.view.cached(self.tab)
    }

    /// Filtered listings of any tab.
    pub fn listings(&self, kind: ListingKind) -> Arc<[Listing]> {
        self.view.cached(kind)
    }

    /// Add the visible listing with `id` from the active tab using the selected duration.
    pub fn add_listing(&mut self, id: &str) -> Result<&CartItem, AddError> {
        let kind = self.tab;
        let visible = self.view.cached(kind);
        let listing = visible
            .iter()
            .find(|listing| listing.id == id)
            .ok_or_else(|| AddError::UnknownListing {
                id: id.to_string(),
                kind,
            })?;
        if !listing.is_bookable(kind) {
            return Err(AddError::Unavailable(listing.title.clone()));
        }
        let item = CartItem::new(listing.clone(), kind, self.duration.clone())?;
        info!(id, %kind, duration = %self.duration, price = item.total_price, "Added to cart");
        self.cart.add(item);
        self.cart
            .get(id)
            .ok_or_else(|| AddError::UnknownListing {
                id: id.to_string(),
                kind,
            })
    }

    /// Remove a cart line. Absent ids are ignored.
    pub fn remove_from_cart(&mut self, id: &str) -> bool {
        let removed = self.cart.remove(id);
        if removed {
            info!(id, "Removed from cart");
        }
        removed
    }

    /// Current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Selected booking date.
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    /// Select or clear the booking date.
    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.selected_date = date;
    }

    /// Clear the booking date.
    pub fn clear_date(&mut self) {
        self.selected_date = None;
    }

    /// Booking flow state.
    pub fn booking(&self) -> &BookingFlow {
        &self.booking
    }

    /// Submit the cart for the selected date.
    pub fn submit_booking(&mut self) -> SubmitOutcome {
        self.booking.submit(&self.cart, self.selected_date)
    }

    /// Apply the confirmation of a pending attempt.
    pub fn confirm_booking(&mut self, attempt: AttemptId) -> Option<NoticeId> {
        self.booking.confirm(attempt, &mut self.cart)
    }

    /// Hide the success notice if it is still current.
    pub fn expire_notice(&mut self, notice: NoticeId) -> bool {
        self.booking.expire_notice(notice)
    }

    fn refresh_view(&mut self) {
        self.view
            .refresh(&self.catalog, self.revision, &self.location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{booking::BookingRejection, models::Listing};

    fn listing(id: &str, price: f64, location: &str, status: Option<&str>) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Listing {id}"),
            description: String::new(),
            image: String::new(),
            details: String::new(),
            price,
            location: location.to_string(),
            availability: None,
            status: status.map(str::to_string),
            rating: None,
            safety_certified: None,
        }
    }

    fn small_catalog() -> Catalog {
        Catalog {
            grounds: vec![
                listing("g1", 500.0, "mumbai", Some("Available")),
                listing("g2", 400.0, "delhi", Some("Booked")),
            ],
            equipment: vec![listing("e1", 200.0, "", None)],
            coaches: vec![listing("c1", 800.0, "delhi", None)],
            ..Catalog::default()
        }
    }

    #[test]
    fn worked_example_adds_twice() {
        let mut store = Storefront::new(small_catalog());
        store.set_duration("2").expect("valid duration");
        store.add_listing("g1").expect("added");
        let line = store.add_listing("g1").expect("added");
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.total_price, 1000.0);
        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart().total(), 2000.0);
    }

    #[test]
    fn booked_ground_cannot_be_added() {
        let mut store = Storefront::new(small_catalog());
        assert_eq!(
            store.add_listing("g2").unwrap_err(),
            AddError::Unavailable("Listing g2".to_string())
        );
        assert!(store.cart().is_empty());
    }

    #[test]
    fn add_only_sees_filtered_active_tab() {
        let mut store = Storefront::new(small_catalog());
        store.set_location(LocationFilter::city("delhi"));
        assert!(matches!(
            store.add_listing("g1"),
            Err(AddError::UnknownListing { .. })
        ));
        assert!(matches!(
            store.add_listing("c1"),
            Err(AddError::UnknownListing { kind: ListingKind::Ground, .. })
        ));

        store.set_tab(ListingKind::Coach);
        store.add_listing("c1").expect("coach added");
        store.set_tab(ListingKind::Equipment);
        store.add_listing("e1").expect("equipment added");
        assert_eq!(store.cart().item_count(), 2);
    }

    #[test]
    fn equipment_line_ignores_selected_duration() {
        let mut store = Storefront::new(small_catalog());
        store.set_tab(ListingKind::Equipment);
        store.set_duration("4").expect("valid duration");
        let line = store.add_listing("e1").expect("added");
        assert_eq!(line.total_price, 200.0);
    }

    #[test]
    fn location_cycle_wraps_through_catalog_tags() {
        let mut store = Storefront::new(small_catalog());
        assert_eq!(store.cycle_location(), &LocationFilter::city("mumbai"));
        assert_eq!(store.listings(ListingKind::Ground)[0].id, "g1");
        assert_eq!(store.cycle_location(), &LocationFilter::city("delhi"));
        assert_eq!(store.listings(ListingKind::Ground).len(), 1);
        assert_eq!(store.listings(ListingKind::Equipment).len(), 1);
        assert_eq!(store.cycle_location(), &LocationFilter::All);
        assert_eq!(store.listings(ListingKind::Ground).len(), 2);
    }

    #[test]
    fn builtin_location_cycle_follows_catalog_order() {
        let mut store = Storefront::new(Catalog::builtin().clone());
        let cycle: Vec<String> = (0..4)
            .map(|_| store.cycle_location().to_string())
            .collect();
        assert_eq!(cycle, vec!["mumbai", "delhi", "hyderabad", "all"]);
    }

    #[test]
    fn non_ascii_location_tags_filter_their_listings() {
        let mut catalog = small_catalog();
        catalog.grounds[0].location = "ÉVORA".to_string();
        let mut store = Storefront::new(catalog);
        let options = store.location_options();
        assert_eq!(options[1], LocationFilter::city("évora"));
        store.set_location(options[1].clone());
        assert_eq!(store.visible_listings().len(), 1);
        assert_eq!(store.visible_listings()[0].id, "g1");
    }

    #[test]
    fn view_stays_stable_without_input_changes() {
        let mut store = Storefront::new(small_catalog());
        let before = store.visible_listings();
        store.set_location(LocationFilter::All);
        store.set_duration("3").expect("valid duration");
        assert!(Arc::ptr_eq(&before, &store.visible_listings()));

        store.replace_catalog(small_catalog());
        assert!(!Arc::ptr_eq(&before, &store.visible_listings()));
    }

    #[test]
    fn duration_cycles_and_validates() {
        let mut store = Storefront::new(small_catalog());
        assert_eq!(store.duration(), "1");
        assert_eq!(store.cycle_duration(), "2");
        store.set_duration("4").expect("valid duration");
        assert_eq!(store.cycle_duration(), "1");
        assert!(store.set_duration("abc").is_err());
        assert_eq!(store.duration(), "1");
    }

    #[test]
    fn booking_runs_through_validation_then_success() {
        let mut store = Storefront::new(small_catalog());
        assert_eq!(
            store.submit_booking(),
            SubmitOutcome::Rejected(BookingRejection::EmptyCart)
        );

        store.add_listing("g1").expect("added");
        assert_eq!(
            store.submit_booking(),
            SubmitOutcome::Rejected(BookingRejection::MissingDate)
        );

        store.set_date(NaiveDate::from_ymd_opt(2026, 10, 30));
        let SubmitOutcome::Pending(attempt) = store.submit_booking() else {
            panic!("expected pending submission");
        };
        let notice = store.confirm_booking(attempt).expect("notice raised");
        assert!(store.cart().is_empty());
        assert!(store.booking().success());
        assert!(store.booking().error_message().is_none());
        assert!(store.expire_notice(notice));
        assert!(!store.booking().success());
    }

    #[test]
    fn config_selectors_apply_at_startup() {
        let config = AppConfig {
            default_location: "Mumbai".to_string(),
            default_duration: "3".to_string(),
            ..AppConfig::default()
        };
        let store = Storefront::with_config(small_catalog(), &config).expect("valid config");
        assert_eq!(store.location(), &LocationFilter::city("mumbai"));
        assert_eq!(store.duration(), "3");
        assert_eq!(store.visible_listings().len(), 1);
    }
}
