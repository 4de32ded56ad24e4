//! Recently viewed restaurants and menu items, most recent first.

use crate::storage::PreferencesStorage;
use tracing::warn;

/// Entries kept per list.
pub const MAX_RECENT: usize = 20;

#[derive(Debug, Clone)]
pub struct RecentlyViewed {
    storage: PreferencesStorage,
    restaurant_ids: Vec<String>,
    menu_item_ids: Vec<String>,
}

impl RecentlyViewed {
    /// Loads persisted lists, keeping their order while dropping duplicates and overflow.
    #[must_use]
    pub fn load(storage: PreferencesStorage) -> Self {
        let restaurant_ids = normalize(storage.load_recent_restaurant_ids());
        let menu_item_ids = normalize(storage.load_recent_menu_item_ids());
        Self {
            storage,
            restaurant_ids,
            menu_item_ids,
        }
    }

    #[must_use]
    pub fn restaurant_ids(&self) -> &[String] {
        &self.restaurant_ids
    }

    #[must_use]
    pub fn menu_item_ids(&self) -> &[String] {
        &self.menu_item_ids
    }

    pub fn record_restaurant_view(&mut self, restaurant_id: &str) {
        if push_front(&mut self.restaurant_ids, restaurant_id) {
            if let Err(e) = self.storage.save_recent_restaurant_ids(&self.restaurant_ids) {
                warn!("Failed to persist recent restaurants: {}", e);
            }
        }
    }

    pub fn record_menu_item_view(&mut self, item_id: &str) {
        if push_front(&mut self.menu_item_ids, item_id) {
            if let Err(e) = self.storage.save_recent_menu_item_ids(&self.menu_item_ids) {
                warn!("Failed to persist recent menu items: {}", e);
            }
        }
    }
}

fn push_front(ids: &mut Vec<String>, id: &str) -> bool {
    if id.trim().is_empty() {
        return false;
    }
    ids.retain(|existing| existing != id);
    ids.insert(0, id.to_string());
    ids.truncate(MAX_RECENT);
    true
}

fn normalize(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len().min(MAX_RECENT));
    for id in ids {
        if out.len() == MAX_RECENT {
            break;
        }
        if !id.trim().is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::in_memory_storage;

    #[test]
    fn test_most_recent_first_without_duplicates() {
        let mut recent = RecentlyViewed::load(in_memory_storage());
        recent.record_restaurant_view("a");
        recent.record_restaurant_view("b");
        recent.record_restaurant_view("a");
        recent.record_restaurant_view(" ");
        assert_eq!(recent.restaurant_ids(), ["a", "b"]);
    }

    #[test]
    fn test_list_is_capped() {
        let mut recent = RecentlyViewed::load(in_memory_storage());
        for i in 0..30 {
            recent.record_menu_item_view(&format!("item{i}"));
        }
        assert_eq!(recent.menu_item_ids().len(), MAX_RECENT);
        assert_eq!(recent.menu_item_ids()[0], "item29");
        assert_eq!(recent.menu_item_ids()[MAX_RECENT - 1], "item10");
    }

    #[test]
    fn test_reload_keeps_order() {
        let storage = in_memory_storage();
        let mut recent = RecentlyViewed::load(storage.clone());
        recent.record_restaurant_view("old");
        recent.record_restaurant_view("new");

        let reloaded = RecentlyViewed::load(storage);
        assert_eq!(reloaded.restaurant_ids(), ["new", "old"]);
    }
}
