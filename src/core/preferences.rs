//! User-facing toggles persisted under the `pref_` prefix.

use crate::config::Catalog;
use crate::core::favorites::Favorites;
use crate::models::Restaurant;
use crate::storage::PreferencesStorage;
use tracing::warn;

const HOME_FAVORITES_ONLY: &str = "home_favorites_only";

#[derive(Debug, Clone)]
pub struct AppPreferences {
    storage: PreferencesStorage,
    home_favorites_only: bool,
}

impl AppPreferences {
    /// Loads persisted preferences; unreadable values fall back to `false`.
    #[must_use]
    pub fn load(storage: PreferencesStorage) -> Self {
        let home_favorites_only = storage
            .load_preference(HOME_FAVORITES_ONLY)
            .and_then(|raw| parse_strict_bool(&raw))
            .unwrap_or(false);
        Self {
            storage,
            home_favorites_only,
        }
    }

    /// Whether the home list shows only favourite restaurants.
    #[must_use]
    pub const fn home_favorites_only(&self) -> bool {
        self.home_favorites_only
    }

    /// Restaurants for the home list in catalog order, limited to favourites when
    /// [`AppPreferences::home_favorites_only`] is set.
    #[must_use]
    pub fn home_restaurants<'c>(&self, catalog: &'c Catalog, favorites: &Favorites) -> Vec<&'c Restaurant> {
        catalog
            .restaurants()
            .iter()
            .filter(|r| !self.home_favorites_only || favorites.is_restaurant_favorite(&r.id))
            .collect()
    }

    pub fn set_home_favorites_only(&mut self, enabled: bool) {
        self.home_favorites_only = enabled;
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.storage.save_preference(HOME_FAVORITES_ONLY, Some(value)) {
            warn!("Failed to persist preference {}: {}", HOME_FAVORITES_ONLY, e);
        }
    }
}

fn parse_strict_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::test_utils::{in_memory_storage, sample_catalog};

    #[test]
    fn test_round_trip_and_garbage() -> Result<()> {
        let storage = in_memory_storage();
        assert!(!AppPreferences::load(storage.clone()).home_favorites_only());

        AppPreferences::load(storage.clone()).set_home_favorites_only(true);
        assert!(AppPreferences::load(storage.clone()).home_favorites_only());

        storage.save_preference(HOME_FAVORITES_ONLY, Some("yes please"))?;
        assert!(!AppPreferences::load(storage).home_favorites_only());
        Ok(())
    }

    #[test]
    fn test_home_restaurants_respects_favorites_only() {
        let storage = in_memory_storage();
        let catalog = sample_catalog();
        let mut favorites = Favorites::load(storage.clone());
        favorites.toggle_restaurant("sushi_go");
        let mut preferences = AppPreferences::load(storage.clone());

        let ids = |list: Vec<&Restaurant>| list.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(
            ids(preferences.home_restaurants(&catalog, &favorites)),
            ["burger_barn", "taco_town", "sushi_go"]
        );

        preferences.set_home_favorites_only(true);
        assert_eq!(ids(preferences.home_restaurants(&catalog, &favorites)), ["sushi_go"]);

        // survives a reload
        let reloaded = AppPreferences::load(storage);
        assert_eq!(ids(reloaded.home_restaurants(&catalog, &favorites)), ["sushi_go"]);
    }
}
