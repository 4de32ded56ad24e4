/// Cart pricing arithmetic, promo codes and fee settings
pub mod pricing;

/// Cart state container with write-through persistence
pub mod cart;

/// Delivery stage state machine, clocks and stage listeners
pub mod delivery;

/// Async driver that advances the active order on time
pub mod scheduler;

/// Favourite restaurants and menu items
pub mod favorites;

/// Recently viewed restaurants and menu items
pub mod recent;

/// Local reviews and per-target rating aggregates
pub mod ratings;

/// Persisted user preferences
pub mod preferences;

/// Home and menu recommendation rankings
pub mod recommendations;

/// Display formatting helpers
pub mod format;
