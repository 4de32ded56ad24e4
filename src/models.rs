//! Catalog and cart data model.
//!
//! Restaurants, menu items and their option groups are loaded from the catalog file;
//! [`ItemConfiguration`] and [`CartLine`] describe what the user put into the cart.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A restaurant listed on the home screen.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cuisine_tags: Vec<String>,
    pub rating: f64,
    pub eta_minutes_min: u32,
    pub eta_minutes_max: u32,
    #[serde(default)]
    pub banner_color_hex: String,
}

/// A menu category within a restaurant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MenuCategory {
    pub id: String,
    pub title: String,
}

/// A selectable option belonging to a variant or add-on group.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub price_delta_cents: i64, // added to the base price when selected
}

/// Single-select option group (size, spice level, ...).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VariantGroup {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    pub options: Vec<OptionItem>,
}

/// Multi-select option group (extra cheese, dips, ...).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AddOnGroup {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_selections: u32,
    #[serde(default)]
    pub max_selections: Option<u32>, // None means unlimited
    pub options: Vec<OptionItem>,
}

/// A menu item that can be added to the cart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub is_veg: bool,
    #[serde(default)]
    pub variant_groups: Vec<VariantGroup>,
    #[serde(default)]
    pub add_on_groups: Vec<AddOnGroup>,
}

impl MenuItem {
    /// Returns true when the item carries any variant or add-on groups.
    #[must_use]
    pub fn has_options(&self) -> bool {
        !self.variant_groups.is_empty() || !self.add_on_groups.is_empty()
    }

    /// Default configuration: the first option of every required variant group, no add-ons.
    #[must_use]
    pub fn default_configuration(&self) -> ItemConfiguration {
        let selected_variants = self
            .variant_groups
            .iter()
            .filter(|group| group.required)
            .filter_map(|group| {
                group
                    .options
                    .first()
                    .map(|first| (group.id.clone(), first.id.clone()))
            })
            .collect();

        ItemConfiguration {
            selected_variants,
            selected_add_ons: BTreeSet::new(),
        }
    }
}

/// The selected configuration for a cart line.
///
/// Both collections are ordered, so the derived equality and [`ItemConfiguration::stable_key`]
/// are independent of the order in which options were picked.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemConfiguration {
    /// Variant group id -> option id
    pub selected_variants: BTreeMap<String, String>,
    /// Add-on option ids across all groups
    pub selected_add_ons: BTreeSet<String>,
}

impl ItemConfiguration {
    /// Canonical key distinguishing configurations of the same menu item, e.g. `v{size=large}|a{cheese}`.
    #[must_use]
    pub fn stable_key(&self) -> String {
        format!(
            "v{{{}}}|a{{{}}}",
            self.encoded_variants(),
            self.encoded_add_ons()
        )
    }

    /// Variant selections as `group=option` pairs joined by commas.
    #[must_use]
    pub fn encoded_variants(&self) -> String {
        self.selected_variants
            .iter()
            .map(|(group, option)| format!("{group}={option}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Add-on selections joined by commas.
    #[must_use]
    pub fn encoded_add_ons(&self) -> String {
        self.selected_add_ons
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses the output of [`ItemConfiguration::encoded_variants`] and
    /// [`ItemConfiguration::encoded_add_ons`]. Malformed tokens are skipped.
    #[must_use]
    pub fn from_encoded(variants: &str, add_ons: &str) -> Self {
        let selected_variants = variants
            .split(',')
            .filter_map(|token| {
                let (group, option) = token.trim().split_once('=')?;
                if group.trim().is_empty() || option.trim().is_empty() {
                    return None;
                }
                Some((group.to_string(), option.to_string()))
            })
            .collect();

        let selected_add_ons = add_ons
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
            .collect();

        Self {
            selected_variants,
            selected_add_ons,
        }
    }
}

/// One configured menu item in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: MenuItem,
    pub configuration: ItemConfiguration,
    pub quantity: u32,
    pub note: String,
}

impl CartLine {
    /// Identity of this line inside a cart: `item_id#stable_key`.
    #[must_use]
    pub fn key(&self) -> String {
        line_key(&self.item.id, &self.configuration)
    }

    /// Base price plus the configured option deltas.
    #[must_use]
    pub fn unit_price_cents(&self) -> i64 {
        self.item.price_cents + options_delta_cents(&self.item, &self.configuration)
    }
}

/// Builds the cart identity for an item id and configuration.
#[must_use]
pub fn line_key(item_id: &str, configuration: &ItemConfiguration) -> String {
    format!("{item_id}#{}", configuration.stable_key())
}

/// Total option delta (variants + add-ons) for an item and configuration.
///
/// Selections that do not match an option of the item contribute nothing.
#[must_use]
pub fn options_delta_cents(item: &MenuItem, configuration: &ItemConfiguration) -> i64 {
    let variant_delta: i64 = item
        .variant_groups
        .iter()
        .filter_map(|group| {
            let selected = configuration.selected_variants.get(&group.id)?;
            group
                .options
                .iter()
                .find(|option| &option.id == selected)
                .map(|option| option.price_delta_cents)
        })
        .sum();

    let add_on_delta: i64 = item
        .add_on_groups
        .iter()
        .flat_map(|group| group.options.iter())
        .filter(|option| configuration.selected_add_ons.contains(&option.id))
        .map(|option| option.price_delta_cents)
        .sum();

    variant_delta + add_on_delta
}

/// Human-readable summary of the chosen options, e.g. `Size: Large • Add-ons: Cheese, Salsa`.
#[must_use]
pub fn configuration_summary(item: &MenuItem, configuration: &ItemConfiguration) -> String {
    let mut parts: Vec<String> = item
        .variant_groups
        .iter()
        .filter_map(|group| {
            let selected = configuration.selected_variants.get(&group.id)?;
            let option = group.options.iter().find(|option| &option.id == selected)?;
            Some(format!("{}: {}", group.title, option.title))
        })
        .collect();

    let add_ons: Vec<&str> = item
        .add_on_groups
        .iter()
        .flat_map(|group| group.options.iter())
        .filter(|option| configuration.selected_add_ons.contains(&option.id))
        .map(|option| option.title.as_str())
        .collect();

    if !add_ons.is_empty() {
        parts.push(format!("Add-ons: {}", add_ons.join(", ")));
    }

    parts.join(" • ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_stable_key_is_order_independent() {
        let mut a = ItemConfiguration::default();
        a.selected_add_ons.insert("salsa".to_string());
        a.selected_add_ons.insert("cheese".to_string());
        a.selected_variants
            .insert("size".to_string(), "large".to_string());

        let mut b = ItemConfiguration::default();
        b.selected_variants
            .insert("size".to_string(), "large".to_string());
        b.selected_add_ons.insert("cheese".to_string());
        b.selected_add_ons.insert("salsa".to_string());

        assert_eq!(a.stable_key(), b.stable_key());
        assert_eq!(a.stable_key(), "v{size=large}|a{cheese,salsa}");
        assert_eq!(ItemConfiguration::default().stable_key(), "v{}|a{}");
    }

    #[test]
    fn test_from_encoded_skips_malformed_tokens() {
        let config = ItemConfiguration::from_encoded("size=large,=x,broken,spice=", " cheese, ,salsa");
        assert_eq!(config.selected_variants.len(), 1);
        assert_eq!(config.selected_variants["size"], "large");
        assert_eq!(config.selected_add_ons.len(), 2);
        assert!(config.selected_add_ons.contains("cheese"));
    }

    #[test]
    fn test_options_delta_sums_variant_and_add_ons() {
        let item = sample_configurable_item();
        let config = configured(&[("size", "size_large")], &["cheese", "salsa"]);
        // large 250 + cheese 100 + salsa 75
        assert_eq!(options_delta_cents(&item, &config), 425);
    }

    #[test]
    fn test_options_delta_ignores_unknown_selections() {
        let item = sample_configurable_item();
        let config = configured(&[("size", "size_giant"), ("ghost", "x")], &["nope"]);
        assert_eq!(options_delta_cents(&item, &config), 0);
    }

    #[test]
    fn test_default_configuration_picks_first_required_option() {
        let item = sample_configurable_item();
        let config = item.default_configuration();
        assert_eq!(config.selected_variants.get("size").map(String::as_str), Some("size_regular"));
        // spice group is optional and stays unselected
        assert!(!config.selected_variants.contains_key("spice"));
        assert!(config.selected_add_ons.is_empty());
    }

    #[test]
    fn test_configuration_summary() {
        let item = sample_configurable_item();
        let config = configured(&[("size", "size_large")], &["cheese"]);
        assert_eq!(
            configuration_summary(&item, &config),
            "Size: Large • Add-ons: Extra cheese"
        );
        assert_eq!(configuration_summary(&item, &ItemConfiguration::default()), "");
    }
}
