//! Shared test utilities for `dashcart`.
//!
//! Fixture menu items, a small three-restaurant catalog, in-memory storage and a
//! manually driven clock.

#![allow(clippy::unwrap_used)]

use crate::{
    config::Catalog,
    core::delivery::Clock,
    models::{
        AddOnGroup, CartLine, ItemConfiguration, MenuCategory, MenuItem, OptionItem, Restaurant,
        VariantGroup,
    },
    storage::PreferencesStorage,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};

/// Creates an option-less menu item named after its id.
///
/// # Defaults
/// * `restaurant_id`: "test_restaurant"
/// * `category_id`: "mains"
pub fn plain_item(id: &str, price_cents: i64) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        restaurant_id: "test_restaurant".to_string(),
        category_id: "mains".to_string(),
        name: id.to_string(),
        description: String::new(),
        price_cents,
        is_veg: false,
        variant_groups: Vec::new(),
        add_on_groups: Vec::new(),
    }
}

fn option(id: &str, title: &str, price_delta_cents: i64) -> OptionItem {
    OptionItem {
        id: id.to_string(),
        title: title.to_string(),
        price_delta_cents,
    }
}

/// The "Burrito" of Taco Town, priced 1000.
///
/// * Size (required): `size_regular` +0, `size_large` +250
/// * Spice (optional): `spice_mild` +0, `spice_hot` +50
/// * Extras add-ons: `cheese` "Extra cheese" +100, `salsa` "Salsa" +75
pub fn sample_configurable_item() -> MenuItem {
    MenuItem {
        id: "burrito".to_string(),
        restaurant_id: "taco_town".to_string(),
        category_id: "mains".to_string(),
        name: "Burrito".to_string(),
        description: "Rice, beans and grilled chicken".to_string(),
        price_cents: 1000,
        is_veg: false,
        variant_groups: vec![
            VariantGroup {
                id: "size".to_string(),
                title: "Size".to_string(),
                required: true,
                options: vec![
                    option("size_regular", "Regular", 0),
                    option("size_large", "Large", 250),
                ],
            },
            VariantGroup {
                id: "spice".to_string(),
                title: "Spice".to_string(),
                required: false,
                options: vec![
                    option("spice_mild", "Mild", 0),
                    option("spice_hot", "Hot", 50),
                ],
            },
        ],
        add_on_groups: vec![AddOnGroup {
            id: "extras".to_string(),
            title: "Extras".to_string(),
            required: false,
            min_selections: 0,
            max_selections: None,
            options: vec![
                option("cheese", "Extra cheese", 100),
                option("salsa", "Salsa", 75),
            ],
        }],
    }
}

/// Builds a configuration from `(group, option)` pairs and add-on ids.
pub fn configured(variants: &[(&str, &str)], add_ons: &[&str]) -> ItemConfiguration {
    ItemConfiguration {
        selected_variants: variants
            .iter()
            .map(|(group, option)| ((*group).to_string(), (*option).to_string()))
            .collect(),
        selected_add_ons: add_ons.iter().map(|id| (*id).to_string()).collect(),
    }
}

/// A cart line with the item's default configuration and no note.
pub fn line(item: &MenuItem, quantity: u32) -> CartLine {
    CartLine {
        item: item.clone(),
        configuration: item.default_configuration(),
        quantity,
        note: String::new(),
    }
}

pub fn in_memory_storage() -> PreferencesStorage {
    PreferencesStorage::in_memory()
}

fn restaurant(id: &str, name: &str, tags: &[&str], rating: f64, eta: (u32, u32)) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: name.to_string(),
        cuisine_tags: tags.iter().map(|t| (*t).to_string()).collect(),
        rating,
        eta_minutes_min: eta.0,
        eta_minutes_max: eta.1,
        banner_color_hex: "#FF7043".to_string(),
    }
}

fn catalog_item(id: &str, restaurant_id: &str, name: &str, price_cents: i64) -> MenuItem {
    MenuItem {
        restaurant_id: restaurant_id.to_string(),
        name: name.to_string(),
        ..plain_item(id, price_cents)
    }
}

/// Three restaurants:
///
/// | id            | rating | cuisines          | items                      |
/// |---------------|--------|-------------------|----------------------------|
/// | `burger_barn` | 4.1    | American, Burgers | Classic Burger             |
/// | `taco_town`   | 4.7    | Mexican           | Burrito, Nachos, Churros   |
/// | `sushi_go`    | 4.8    | Japanese          | Salmon Nigiri              |
pub fn sample_catalog() -> Catalog {
    Catalog::new(
        vec![
            restaurant("burger_barn", "Burger Barn", &["American", "Burgers"], 4.1, (25, 35)),
            restaurant("taco_town", "Taco Town", &["Mexican"], 4.7, (20, 30)),
            restaurant("sushi_go", "Sushi Go", &["Japanese"], 4.8, (30, 45)),
        ],
        vec![
            MenuCategory {
                id: "mains".to_string(),
                title: "Mains".to_string(),
            },
            MenuCategory {
                id: "sides".to_string(),
                title: "Sides".to_string(),
            },
        ],
        vec![
            catalog_item("classic_burger", "burger_barn", "Classic Burger", 1099),
            sample_configurable_item(),
            catalog_item("nachos", "taco_town", "Nachos", 650),
            catalog_item("churros", "taco_town", "Churros", 400),
            catalog_item("salmon_nigiri", "sushi_go", "Salmon Nigiri", 1200),
        ],
    )
    .unwrap()
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Starts at 2023-11-14T22:13:20Z (epoch millis 1 700 000 000 000).
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(
                DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            )),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
