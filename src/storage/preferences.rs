//! Typed persistence on top of a [`KeyValueStore`].
//!
//! Loads are defensive: missing or malformed values come back as empty/default.
//! Saves surface store failures so callers decide whether to log or propagate.

use super::KeyValueStore;
use crate::codec::{delivery, ratings, safe};
use crate::codec::safe::StoredCartLine;
use crate::core::delivery::StoredDeliveryOrder;
use crate::core::pricing::{AppliedPromo, FeeSettings};
use crate::core::ratings::{RatingAggregate, Review, ReviewTarget};
use crate::errors::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const KEY_FAVORITE_RESTAURANTS: &str = "favorites_restaurants_v1";
const KEY_FAVORITE_MENU_ITEMS: &str = "favorites_menu_items_v1";
const KEY_RECENT_RESTAURANTS: &str = "recent_restaurants_v1";
const KEY_RECENT_MENU_ITEMS: &str = "recent_menu_items_v1";
const KEY_CART_LINES: &str = "cart_lines_v1";
const KEY_CART_PROMO: &str = "cart_promo_v1";
const KEY_CART_FEE_SETTINGS: &str = "cart_fee_settings_v1";
const KEY_CART_ORDER_INSTRUCTIONS: &str = "cart_order_instructions_v1";
const KEY_DELIVERY_ACTIVE_ORDER: &str = "delivery_active_order_v1";
const KEY_RATINGS_REVIEWS: &str = "ratings_reviews_v1";
const KEY_RATINGS_AGGREGATES: &str = "ratings_aggregates_v1";
const PREF_PREFIX: &str = "pref_";

/// Cloneable handle shared by every repository.
#[derive(Clone)]
pub struct PreferencesStorage {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PreferencesStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesStorage").finish_non_exhaustive()
    }
}

impl PreferencesStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Convenience constructor over a fresh [`super::MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::MemoryStore::new()))
    }

    fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
        self.store.put(key, value)
    }

    // --- Favorites ---

    pub fn load_favorite_restaurant_ids(&self) -> BTreeSet<String> {
        safe::decode_string_set(self.get(KEY_FAVORITE_RESTAURANTS).as_deref())
    }

    pub fn save_favorite_restaurant_ids(&self, ids: &BTreeSet<String>) -> Result<()> {
        self.put(KEY_FAVORITE_RESTAURANTS, Some(safe::encode_string_set(ids).as_str()))
    }

    pub fn load_favorite_menu_item_ids(&self) -> BTreeSet<String> {
        safe::decode_string_set(self.get(KEY_FAVORITE_MENU_ITEMS).as_deref())
    }

    pub fn save_favorite_menu_item_ids(&self, ids: &BTreeSet<String>) -> Result<()> {
        self.put(KEY_FAVORITE_MENU_ITEMS, Some(safe::encode_string_set(ids).as_str()))
    }

    // --- Recently viewed ---

    pub fn load_recent_restaurant_ids(&self) -> Vec<String> {
        safe::decode_string_list(self.get(KEY_RECENT_RESTAURANTS).as_deref())
    }

    pub fn save_recent_restaurant_ids(&self, ids: &[String]) -> Result<()> {
        self.put(KEY_RECENT_RESTAURANTS, Some(safe::encode_string_list(ids).as_str()))
    }

    pub fn load_recent_menu_item_ids(&self) -> Vec<String> {
        safe::decode_string_list(self.get(KEY_RECENT_MENU_ITEMS).as_deref())
    }

    pub fn save_recent_menu_item_ids(&self, ids: &[String]) -> Result<()> {
        self.put(KEY_RECENT_MENU_ITEMS, Some(safe::encode_string_list(ids).as_str()))
    }

    // --- Cart ---

    pub fn load_cart_lines(&self) -> Vec<StoredCartLine> {
        safe::decode_cart_lines(self.get(KEY_CART_LINES).as_deref())
    }

    pub fn save_cart_lines(&self, lines: &[StoredCartLine]) -> Result<()> {
        self.put(KEY_CART_LINES, Some(safe::encode_cart_lines(lines).as_str()))
    }

    pub fn load_cart_promo(&self) -> Option<AppliedPromo> {
        safe::decode_applied_promo(self.get(KEY_CART_PROMO).as_deref())
    }

    /// `None` removes the persisted promo.
    pub fn save_cart_promo(&self, promo: Option<&AppliedPromo>) -> Result<()> {
        let encoded = promo.map(safe::encode_applied_promo);
        self.put(KEY_CART_PROMO, encoded.as_deref())
    }

    pub fn load_cart_fee_settings(&self) -> Option<FeeSettings> {
        safe::decode_fee_settings(self.get(KEY_CART_FEE_SETTINGS).as_deref())
    }

    pub fn save_cart_fee_settings(&self, settings: &FeeSettings) -> Result<()> {
        self.put(
            KEY_CART_FEE_SETTINGS,
            Some(safe::encode_fee_settings(settings).as_str()),
        )
    }

    pub fn load_order_instructions(&self) -> String {
        self.get(KEY_CART_ORDER_INSTRUCTIONS).unwrap_or_default()
    }

    pub fn save_order_instructions(&self, instructions: &str) -> Result<()> {
        let value = Some(instructions).filter(|i| !i.is_empty());
        self.put(KEY_CART_ORDER_INSTRUCTIONS, value)
    }

    // --- Delivery ---

    pub fn load_active_delivery_order(&self) -> Option<StoredDeliveryOrder> {
        delivery::decode(self.get(KEY_DELIVERY_ACTIVE_ORDER).as_deref())
    }

    /// `None` removes the persisted order.
    pub fn save_active_delivery_order(&self, order: Option<&StoredDeliveryOrder>) -> Result<()> {
        let encoded = order.map(delivery::encode);
        self.put(KEY_DELIVERY_ACTIVE_ORDER, encoded.as_deref())
    }

    // --- Ratings ---

    pub fn load_reviews(&self) -> Vec<Review> {
        ratings::decode_reviews(self.get(KEY_RATINGS_REVIEWS).as_deref())
    }

    pub fn save_reviews<'a, I>(&self, reviews: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Review>,
    {
        self.put(KEY_RATINGS_REVIEWS, Some(ratings::encode_reviews(reviews).as_str()))
    }

    pub fn load_rating_aggregates(&self) -> BTreeMap<ReviewTarget, RatingAggregate> {
        ratings::decode_aggregates(self.get(KEY_RATINGS_AGGREGATES).as_deref())
    }

    pub fn save_rating_aggregates(
        &self,
        aggregates: &BTreeMap<ReviewTarget, RatingAggregate>,
    ) -> Result<()> {
        self.put(
            KEY_RATINGS_AGGREGATES,
            Some(ratings::encode_aggregates(aggregates).as_str()),
        )
    }

    // --- Preferences ---

    pub fn load_preference(&self, name: &str) -> Option<String> {
        self.get(&format!("{PREF_PREFIX}{name}"))
    }

    pub fn save_preference(&self, name: &str, value: Option<&str>) -> Result<()> {
        self.put(&format!("{PREF_PREFIX}{name}"), value)
    }
}
