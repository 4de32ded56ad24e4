use dashcart::{
    config::{self, Paths},
    core::{
        cart::Cart,
        delivery::{Clock, DeliveryTracker, LoggingListener, TokioClock},
        favorites::Favorites,
        preferences::AppPreferences,
        format::{format_cart_receipt, format_money, format_order_status, format_stage_progress},
        pricing::PromoApplyResult,
        ratings::{Ratings, ReviewTarget},
        recent::RecentlyViewed,
        recommendations::{Signals, home_recommendations, menu_recommendations},
        scheduler,
    },
    errors::{Error, Result},
    storage::{FileStore, KeyValueStore, MemoryStore, PreferencesStorage},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Settings and catalog
    let paths = Paths::from_env()?;
    let app_config = config::load_config(&paths.config)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let catalog = config::load_catalog(&paths.catalog)
        .inspect_err(|e| error!("Failed to load catalog: {}", e))?;

    // 4. Storage shared by every repository
    let store: Arc<dyn KeyValueStore> = match paths.store_path(&app_config) {
        Some(path) => {
            info!("Using store file {:?}", path);
            Arc::new(FileStore::open(path))
        }
        None => {
            info!("No store path configured, state will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let storage = PreferencesStorage::new(store);
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());

    let mut favorites = Favorites::load(storage.clone());
    let mut recent = RecentlyViewed::load(storage.clone());
    let ratings = Ratings::load(storage.clone(), Arc::clone(&clock));
    let preferences = AppPreferences::load(storage.clone());

    // 5. Browse: list the home screen, pick the top recommendation and look at its menu
    let home = preferences.home_restaurants(&catalog, &favorites);
    info!(
        "Home lists {} restaurants{}: {}",
        home.len(),
        if preferences.home_favorites_only() { " (favourites only)" } else { "" },
        home.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let restaurant = home_recommendations(
        &catalog,
        Signals {
            favorites: &favorites,
            recent: &recent,
            ratings: Some(&ratings),
        },
    )
    .first()
    .copied()
    .ok_or_else(|| Error::Config {
        message: "Catalog has no restaurants".to_string(),
    })?;
    info!("Top pick: {} ({})", restaurant.name, restaurant.cuisine_tags.join(", "));
    if let Some(aggregate) = ratings.aggregate(&ReviewTarget::restaurant(restaurant.id.as_str())) {
        info!("Your rating: {:.1} from {} reviews", aggregate.average, aggregate.count);
    }
    recent.record_restaurant_view(&restaurant.id);
    if !favorites.is_restaurant_favorite(&restaurant.id) {
        favorites.toggle_restaurant(&restaurant.id);
    }

    let picks = menu_recommendations(
        &catalog,
        &restaurant.id,
        Signals {
            favorites: &favorites,
            recent: &recent,
            ratings: Some(&ratings),
        },
    );

    // 6. Fill the cart
    let mut cart = Cart::hydrate(
        storage.clone(),
        app_config.fees,
        app_config.promo_book(),
        Some(&catalog),
    );
    for item in picks.iter().take(2) {
        recent.record_menu_item_view(&item.id);
        cart.add(item);
        info!("Added {} ({})", item.name, format_money(item.price_cents));
    }
    if let Some(first) = picks.first() {
        cart.update_quantity(first, 2);
    }
    match cart.apply_promo_code("save10") {
        PromoApplyResult::Applied => info!("Promo SAVE10 applied"),
        other => warn!("Promo SAVE10 not applied: {:?}", other),
    }
    cart.set_order_instructions("Leave at the door");
    println!("{}", format_cart_receipt(&cart));

    // 7. Checkout and track
    let mut tracker = DeliveryTracker::new(storage, clock, app_config.delivery_timing());
    tracker.add_listener(LoggingListener);

    let resumable = tracker
        .active_order()
        .is_some_and(|order| !order.current_stage.is_terminal());
    if !resumable {
        let order = tracker.place_order_from_cart(&cart, &restaurant.name)?;
        info!("Order {} placed: {}", order.id, order.items_summary);
        cart.clear();
    }

    let final_stage = scheduler::track(&mut tracker, |tracker| {
        let (Some(order), Some(remaining)) = (tracker.active_order(), tracker.remaining()) else {
            return;
        };
        if remaining.as_secs() % 5 == 0 {
            println!(
                "{}  {}",
                format_stage_progress(order.current_stage),
                format_order_status(order, Some(remaining))
            );
        }
    })
    .await;

    match final_stage {
        Some(stage) => info!("Tracking finished at {}", stage.label()),
        None => info!("Order was cancelled"),
    }
    Ok(())
}
