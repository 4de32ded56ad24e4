//! Delivery stage simulator.
//!
//! One active order at a time moves `Placed → Accepted → Preparing → OutForDelivery →
//! Delivered`, one stage per elapsed random delay. The tracker itself owns no timers:
//! callers (see [`crate::core::scheduler`]) poll [`DeliveryTracker::advance_stage_if_due`]
//! when the deadline passes. Every change is written through to storage so a restart
//! resumes the countdown.

use crate::{
    core::cart::Cart,
    errors::{Error, Result},
    storage::PreferencesStorage,
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default lower bound of the per-stage delay in seconds.
pub const DEFAULT_MIN_DELAY_SECS: u32 = 20;
/// Default upper bound of the per-stage delay in seconds.
pub const DEFAULT_MAX_DELAY_SECS: u32 = 30;

const SUMMARY_LINE_LIMIT: usize = 4;

/// Fulfilment stages, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeliveryStage {
    Placed,
    Accepted,
    Preparing,
    OutForDelivery,
    Delivered,
}

impl DeliveryStage {
    pub const ALL: [Self; 5] = [
        Self::Placed,
        Self::Accepted,
        Self::Preparing,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Accepted => "Accepted",
            Self::Preparing => "Preparing",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
        }
    }

    /// Persisted name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "PLACED",
            Self::Accepted => "ACCEPTED",
            Self::Preparing => "PREPARING",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == raw)
    }

    /// The following stage, or `None` for the terminal one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Placed => Some(Self::Accepted),
            Self::Accepted => Some(Self::Preparing),
            Self::Preparing => Some(Self::OutForDelivery),
            Self::OutForDelivery => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Snapshot of the active order, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDeliveryOrder {
    pub id: String,
    pub restaurant_name: String,
    pub items_summary: String,
    pub created_at: DateTime<Utc>,
    pub current_stage: DeliveryStage,
    pub stage_timestamps: BTreeMap<DeliveryStage, DateTime<Utc>>,
    pub next_transition_at: Option<DateTime<Utc>>,
    pub instructions: String,
}

/// Source of "now" for the tracker.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall time anchored at construction, advanced by tokio's monotonic clock.
///
/// Under a paused tokio runtime this follows the virtual time, which keeps the
/// tracker's deadlines consistent with the scheduler's sleeps.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    wall_anchor: DateTime<Utc>,
    anchor: tokio::time::Instant,
}

impl TokioClock {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Starts the clock at a fixed wall time.
    #[must_use]
    pub fn starting_at(wall_anchor: DateTime<Utc>) -> Self {
        Self {
            wall_anchor,
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.anchor.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
        self.wall_anchor
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Inclusive bounds of the random per-stage delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTiming {
    pub min_delay_secs: u32,
    pub max_delay_secs: u32,
}

impl Default for DeliveryTiming {
    fn default() -> Self {
        Self {
            min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

impl DeliveryTiming {
    /// Bounds given in either order.
    #[must_use]
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            min_delay_secs: a.min(b),
            max_delay_secs: a.max(b),
        }
    }
}

/// Receives the active order whenever it is placed or changes stage.
pub trait StageListener {
    fn on_stage_changed(&mut self, order: &StoredDeliveryOrder);
}

impl<F> StageListener for F
where
    F: FnMut(&StoredDeliveryOrder),
{
    fn on_stage_changed(&mut self, order: &StoredDeliveryOrder) {
        self(order);
    }
}

/// Reports stage changes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl StageListener for LoggingListener {
    fn on_stage_changed(&mut self, order: &StoredDeliveryOrder) {
        info!(
            "Order {} from {}: {}",
            order.id,
            order.restaurant_name,
            order.current_stage.label()
        );
    }
}

pub struct DeliveryTracker {
    storage: PreferencesStorage,
    clock: Arc<dyn Clock>,
    timing: DeliveryTiming,
    rng: StdRng,
    active: Option<StoredDeliveryOrder>,
    listeners: Vec<Box<dyn StageListener>>,
}

impl std::fmt::Debug for DeliveryTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryTracker")
            .field("timing", &self.timing)
            .field("active", &self.active)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl DeliveryTracker {
    /// Creates a tracker, resuming any persisted active order.
    pub fn new(storage: PreferencesStorage, clock: Arc<dyn Clock>, timing: DeliveryTiming) -> Self {
        let active = storage.load_active_delivery_order();
        if let Some(order) = &active {
            info!(
                "Resuming order {} at stage {}",
                order.id,
                order.current_stage.label()
            );
        }
        Self {
            storage,
            clock,
            timing,
            rng: StdRng::from_entropy(),
            active,
            listeners: Vec::new(),
        }
    }

    /// Replaces the delay RNG with a seeded one.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn add_listener<L: StageListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    #[must_use]
    pub fn active_order(&self) -> Option<&StoredDeliveryOrder> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn timing(&self) -> DeliveryTiming {
        self.timing
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Places a new order from the cart's current contents, replacing any previous order.
    ///
    /// The cart itself is left untouched.
    pub fn place_order_from_cart(
        &mut self,
        cart: &Cart,
        restaurant_name: &str,
    ) -> Result<StoredDeliveryOrder> {
        if cart.is_empty() {
            return Err(Error::CartEmpty);
        }

        let now = self.clock.now();
        let order = StoredDeliveryOrder {
            id: order_id(now),
            restaurant_name: restaurant_name.trim().to_string(),
            items_summary: items_summary(cart),
            created_at: now,
            current_stage: DeliveryStage::Placed,
            stage_timestamps: BTreeMap::from([(DeliveryStage::Placed, now)]),
            next_transition_at: Some(now + random_delay(&mut self.rng, self.timing)),
            instructions: cart.order_instructions().trim().to_string(),
        };

        if let Some(previous) = &self.active {
            debug!("Order {} superseded by {}", previous.id, order.id);
        }
        info!("Placed order {} ({})", order.id, order.items_summary);

        self.active = Some(order.clone());
        self.persist();
        self.notify();
        Ok(order)
    }

    /// Moves the active order forward one stage if its deadline has passed.
    ///
    /// Returns the new stage, or `None` when nothing changed.
    pub fn advance_stage_if_due(&mut self) -> Option<DeliveryStage> {
        let now = self.clock.now();
        let order = self.active.as_mut()?;

        let Some(next) = order.current_stage.next() else {
            if order.next_transition_at.take().is_some() {
                self.persist();
            }
            return None;
        };

        let deadline = order.next_transition_at?;
        if now < deadline {
            return None;
        }

        order.current_stage = next;
        order.stage_timestamps.insert(next, now);
        order.next_transition_at = if next.is_terminal() {
            None
        } else {
            Some(now + random_delay(&mut self.rng, self.timing))
        };
        debug!("Order {} advanced to {}", order.id, next.as_str());

        self.persist();
        self.notify();
        Some(next)
    }

    /// Deadline of the next stage change.
    #[must_use]
    pub fn next_transition_at(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref()?.next_transition_at
    }

    /// Time left until the next stage change, floored at zero.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = self.next_transition_at()?;
        Some((deadline - self.clock.now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Cancels the active order and removes its persisted snapshot.
    pub fn cancel_active_order(&mut self) -> Result<()> {
        let order = self.active.as_ref().ok_or(Error::NoActiveOrder)?;
        if order.current_stage.is_terminal() {
            return Err(Error::OrderAlreadyDelivered {
                id: order.id.clone(),
            });
        }

        info!("Cancelled order {}", order.id);
        self.active = None;
        self.persist();
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save_active_delivery_order(self.active.as_ref()) {
            warn!("Failed to persist delivery order: {}", e);
        }
    }

    fn notify(&mut self) {
        let Some(order) = &self.active else {
            return;
        };
        for listener in &mut self.listeners {
            listener.on_stage_changed(order);
        }
    }
}

fn random_delay(rng: &mut StdRng, timing: DeliveryTiming) -> TimeDelta {
    let secs = rng.gen_range(timing.min_delay_secs..=timing.max_delay_secs);
    TimeDelta::seconds(i64::from(secs))
}

/// `ORD-` followed by the last six digits of the creation time in epoch millis.
fn order_id(created_at: DateTime<Utc>) -> String {
    format!("ORD-{:06}", created_at.timestamp_millis().rem_euclid(1_000_000))
}

/// "2x Burger, 1x Fries" over the first four lines, then " +N more".
fn items_summary(cart: &Cart) -> String {
    let lines = cart.lines();
    let summary = lines
        .iter()
        .take(SUMMARY_LINE_LIMIT)
        .map(|line| format!("{}x {}", line.quantity, line.item.name))
        .collect::<Vec<_>>()
        .join(", ");
    match lines.len().checked_sub(SUMMARY_LINE_LIMIT) {
        Some(extra) if extra > 0 => format!("{summary} +{extra} more"),
        _ => summary,
    }
}
