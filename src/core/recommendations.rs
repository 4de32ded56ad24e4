//! Deterministic "recommended for you" rankings.
//!
//! Home (restaurants):
//! ```text
//! favourite        +10 000
//! cuisine overlap  +200 per matching tag occurrence in recently viewed restaurants
//! user reviews     +round(average × 100)
//! catalog rating   +round(rating × 1000)
//! ```
//! Menu (items of one restaurant):
//! ```text
//! favourite        +5 000
//! recently viewed  +(20 − position) × 100, floored at 0
//! price            +min(price / 10, 300)
//! has options      +120
//! ```
//! Ties are broken by name; both lists hold at most ten entries.

use crate::{
    config::Catalog,
    core::{
        favorites::Favorites,
        ratings::{Ratings, ReviewTarget},
        recent::RecentlyViewed,
    },
    models::{MenuItem, Restaurant},
};
use std::collections::{BTreeMap, HashSet};

pub const HOME_LIMIT: usize = 10;
pub const MENU_LIMIT: usize = 10;

const FAVORITE_RESTAURANT_BOOST: i64 = 10_000;
const CUISINE_BOOST: i64 = 200;
const FAVORITE_ITEM_BOOST: i64 = 5_000;
const MAX_RECENT_WEIGHT: i64 = 20;
const RECENT_STEP: i64 = 100;
const PRICE_BOOST_CAP: i64 = 300;
const OPTIONS_BOOST: i64 = 120;

/// Signals the rankings draw on.
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub favorites: &'a Favorites,
    pub recent: &'a RecentlyViewed,
    pub ratings: Option<&'a Ratings>,
}

/// Restaurants ranked for the home screen.
#[must_use]
pub fn home_recommendations<'c>(catalog: &'c Catalog, signals: Signals<'_>) -> Vec<&'c Restaurant> {
    let mut cuisine_counts: BTreeMap<&str, i64> = BTreeMap::new();
    for restaurant in signals
        .recent
        .restaurant_ids()
        .iter()
        .filter_map(|id| catalog.restaurant_by_id(id))
    {
        for tag in &restaurant.cuisine_tags {
            *cuisine_counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let score = |restaurant: &Restaurant| -> i64 {
        let favorite = if signals.favorites.is_restaurant_favorite(&restaurant.id) {
            FAVORITE_RESTAURANT_BOOST
        } else {
            0
        };
        let cuisine: i64 = restaurant
            .cuisine_tags
            .iter()
            .map(|tag| cuisine_counts.get(tag.as_str()).copied().unwrap_or(0))
            .sum::<i64>()
            * CUISINE_BOOST;
        let user = signals
            .ratings
            .and_then(|r| r.aggregate(&ReviewTarget::restaurant(restaurant.id.as_str())))
            .filter(|aggregate| aggregate.count > 0)
            .map_or(0, |aggregate| scaled(aggregate.average, 100.0));
        favorite + cuisine + user + scaled(restaurant.rating, 1000.0)
    };

    rank(catalog.restaurants(), score, |r| &r.name, |r| &r.id, HOME_LIMIT)
}

/// Items of `restaurant_id` ranked for its menu screen.
#[must_use]
pub fn menu_recommendations<'c>(
    catalog: &'c Catalog,
    restaurant_id: &str,
    signals: Signals<'_>,
) -> Vec<&'c MenuItem> {
    let items = catalog.menu_for_restaurant(restaurant_id);
    let recent_index: BTreeMap<&str, i64> = signals
        .recent
        .menu_item_ids()
        .iter()
        .zip(0_i64..)
        .map(|(id, idx)| (id.as_str(), idx))
        .collect();

    let score = |item: &MenuItem| -> i64 {
        let favorite = if signals.favorites.is_menu_item_favorite(&item.id) {
            FAVORITE_ITEM_BOOST
        } else {
            0
        };
        let recent = recent_index
            .get(item.id.as_str())
            .map_or(0, |idx| (MAX_RECENT_WEIGHT - idx).max(0) * RECENT_STEP);
        let price = (item.price_cents / 10).min(PRICE_BOOST_CAP);
        let options = if item.has_options() { OPTIONS_BOOST } else { 0 };
        favorite + recent + price + options
    };

    rank(items, score, |i| &i.name, |i| &i.id, MENU_LIMIT)
}

fn rank<'c, T, S, N, I>(
    candidates: impl IntoIterator<Item = &'c T>,
    score: S,
    name: N,
    id: I,
    limit: usize,
) -> Vec<&'c T>
where
    T: 'c,
    S: Fn(&T) -> i64,
    N: Fn(&T) -> &String,
    I: Fn(&T) -> &String,
{
    let mut scored: Vec<(i64, &'c T)> = candidates.into_iter().map(|c| (score(c), c)).collect();
    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| name(a).cmp(name(b))));

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .map(|(_, candidate)| candidate)
        .filter(|candidate| seen.insert(id(candidate).clone()))
        .take(limit)
        .collect()
}

// Cast safety: ratings are within 0..=5, so the product always fits.
#[allow(clippy::cast_possible_truncation)]
fn scaled(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}
