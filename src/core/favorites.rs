//! Favourite restaurants and menu items.

use crate::storage::PreferencesStorage;
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Favorites {
    storage: PreferencesStorage,
    restaurant_ids: BTreeSet<String>,
    menu_item_ids: BTreeSet<String>,
}

impl Favorites {
    /// Loads persisted favourites.
    #[must_use]
    pub fn load(storage: PreferencesStorage) -> Self {
        let restaurant_ids = storage.load_favorite_restaurant_ids();
        let menu_item_ids = storage.load_favorite_menu_item_ids();
        Self {
            storage,
            restaurant_ids,
            menu_item_ids,
        }
    }

    #[must_use]
    pub fn restaurant_ids(&self) -> &BTreeSet<String> {
        &self.restaurant_ids
    }

    #[must_use]
    pub fn menu_item_ids(&self) -> &BTreeSet<String> {
        &self.menu_item_ids
    }

    #[must_use]
    pub fn is_restaurant_favorite(&self, restaurant_id: &str) -> bool {
        self.restaurant_ids.contains(restaurant_id)
    }

    #[must_use]
    pub fn is_menu_item_favorite(&self, item_id: &str) -> bool {
        self.menu_item_ids.contains(item_id)
    }

    /// Flips the favourite flag of a restaurant and returns the new state.
    pub fn toggle_restaurant(&mut self, restaurant_id: &str) -> bool {
        let now_favorite = toggle(&mut self.restaurant_ids, restaurant_id);
        debug!("Restaurant {} favourite: {}", restaurant_id, now_favorite);
        if let Err(e) = self.storage.save_favorite_restaurant_ids(&self.restaurant_ids) {
            warn!("Failed to persist favourite restaurants: {}", e);
        }
        now_favorite
    }

    /// Flips the favourite flag of a menu item and returns the new state.
    pub fn toggle_menu_item(&mut self, item_id: &str) -> bool {
        let now_favorite = toggle(&mut self.menu_item_ids, item_id);
        debug!("Menu item {} favourite: {}", item_id, now_favorite);
        if let Err(e) = self.storage.save_favorite_menu_item_ids(&self.menu_item_ids) {
            warn!("Failed to persist favourite menu items: {}", e);
        }
        now_favorite
    }
}

fn toggle(ids: &mut BTreeSet<String>, id: &str) -> bool {
    let id = id.trim();
    if id.is_empty() {
        return false;
    }
    if ids.remove(id) {
        false
    } else {
        ids.insert(id.to_string());
        true
    }
}
