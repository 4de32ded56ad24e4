//! Restaurant and menu catalog loaded from catalog.toml
//!
//! The catalog is read-only data: restaurants, menu categories and menu items with
//! their option groups. It is checked once on load so lookups can trust it.

use crate::errors::{Error, Result};
use crate::models::{MenuCategory, MenuItem, Restaurant};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Catalog {
    restaurants: Vec<Restaurant>,
    categories: Vec<MenuCategory>,
    items: Vec<MenuItem>,
}

impl Catalog {
    /// Builds and validates a catalog.
    ///
    /// # Errors
    /// Returns `Error::Config` for duplicate ids or items pointing at unknown restaurants.
    pub fn new(
        restaurants: Vec<Restaurant>,
        categories: Vec<MenuCategory>,
        items: Vec<MenuItem>,
    ) -> Result<Self> {
        let catalog = Self {
            restaurants,
            categories,
            items,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut restaurant_ids = BTreeSet::new();
        for restaurant in &self.restaurants {
            if !restaurant_ids.insert(restaurant.id.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate restaurant id in catalog: {}", restaurant.id),
                });
            }
        }

        let mut item_ids = BTreeSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate menu item id in catalog: {}", item.id),
                });
            }
            if !restaurant_ids.contains(item.restaurant_id.as_str()) {
                return Err(Error::Config {
                    message: format!(
                        "Menu item {} references unknown restaurant {}",
                        item.id, item.restaurant_id
                    ),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    #[must_use]
    pub fn categories(&self) -> &[MenuCategory] {
        &self.categories
    }

    #[must_use]
    pub fn restaurant_by_id(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|restaurant| restaurant.id == id)
    }

    #[must_use]
    pub fn category_by_id(&self, id: &str) -> Option<&MenuCategory> {
        self.categories.iter().find(|category| category.id == id)
    }

    #[must_use]
    pub fn item_by_id(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Menu of one restaurant in catalog order.
    #[must_use]
    pub fn menu_for_restaurant(&self, restaurant_id: &str) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|item| item.restaurant_id == restaurant_id)
            .collect()
    }

    /// Like [`Catalog::restaurant_by_id`], but a missing restaurant is an error.
    pub fn require_restaurant(&self, id: &str) -> Result<&Restaurant> {
        self.restaurant_by_id(id)
            .ok_or_else(|| Error::RestaurantNotFound { id: id.to_string() })
    }

    /// Like [`Catalog::item_by_id`], but a missing item is an error.
    pub fn require_item(&self, id: &str) -> Result<&MenuItem> {
        self.item_by_id(id)
            .ok_or_else(|| Error::MenuItemNotFound { id: id.to_string() })
    }
}

/// Loads the catalog from a TOML file
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or parsed, or fails validation.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let path = path.as_ref();
    debug!("Loading catalog from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file {path:?}: {e}"),
    })?;

    let catalog: Catalog = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path:?}: {e}"),
    })?;
    catalog.validate()?;

    info!(
        "Loaded catalog: {} restaurants, {} menu items",
        catalog.restaurants.len(),
        catalog.items.len()
    );
    Ok(catalog)
}
