//! Cart state container - lines, promo, fees and notes, with write-through persistence.
//!
//! Lines are unique per `(item id, configuration key)` and kept in insertion order.
//! Every mutation re-evaluates the "empty cart clears the promo" rule and persists the
//! affected keys when the cart was created with [`Cart::hydrate`]. Persistence failures
//! are logged and never interrupt the in-memory update.

use crate::{
    codec::safe::StoredCartLine,
    config::Catalog,
    core::pricing::{
        self, AppliedPromo, CartTotals, FeeSettings, PromoApplyResult, PromoBook,
    },
    models::{CartLine, ItemConfiguration, MenuItem, line_key},
    storage::PreferencesStorage,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct Cart {
    storage: Option<PreferencesStorage>,
    lines: Vec<CartLine>,
    applied_promo: Option<AppliedPromo>,
    fees: FeeSettings,
    promos: PromoBook,
    order_instructions: String,
}

impl Cart {
    /// Creates an empty, unpersisted cart.
    #[must_use]
    pub fn new(fees: FeeSettings, promos: PromoBook) -> Self {
        Self {
            storage: None,
            lines: Vec::new(),
            applied_promo: None,
            fees,
            promos,
            order_instructions: String::new(),
        }
    }

    /// Restores a cart from storage.
    ///
    /// `fees` is used unless fee settings were persisted. Items found in `catalog` are
    /// restored with their option groups so configuration deltas keep applying; other
    /// items come back with their persisted base fields only. A restored promo is
    /// dropped when no lines survive.
    #[must_use]
    pub fn hydrate(
        storage: PreferencesStorage,
        fees: FeeSettings,
        promos: PromoBook,
        catalog: Option<&Catalog>,
    ) -> Self {
        let mut cart = Self::new(fees, promos);

        for stored in storage.load_cart_lines() {
            let configuration =
                ItemConfiguration::from_encoded(&stored.selected_variants, &stored.selected_add_ons);
            let item = catalog
                .and_then(|c| c.item_by_id(&stored.item_id))
                .cloned()
                .unwrap_or_else(|| menu_item_from_stored(&stored));

            let key = line_key(&item.id, &configuration);
            if let Some(existing) = cart.lines.iter_mut().find(|l| l.key() == key) {
                existing.quantity = existing.quantity.saturating_add(stored.quantity);
            } else {
                cart.lines.push(CartLine {
                    item,
                    configuration,
                    quantity: stored.quantity,
                    note: stored.item_note,
                });
            }
        }

        cart.applied_promo = storage.load_cart_promo();
        if let Some(persisted) = storage.load_cart_fee_settings() {
            cart.fees = persisted;
        }
        cart.order_instructions = storage.load_order_instructions();
        if cart.lines.is_empty() {
            cart.applied_promo = None;
        }

        info!(
            "Cart restored with {} lines (promo: {:?})",
            cart.lines.len(),
            cart.applied_promo.as_ref().map(|p| p.code.as_str())
        );

        cart.storage = Some(storage);
        cart
    }

    // --- Line management ---

    /// Adds one of `item` with its default configuration.
    pub fn add(&mut self, item: &MenuItem) {
        self.add_configured(item, item.default_configuration());
    }

    /// Adds one of `item` with a specific configuration.
    pub fn add_configured(&mut self, item: &MenuItem, configuration: ItemConfiguration) {
        let key = line_key(&item.id, &configuration);
        match self.lines.iter_mut().find(|line| line.key() == key) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                line.item = item.clone();
            }
            None => self.lines.push(CartLine {
                item: item.clone(),
                configuration,
                quantity: 1,
                note: String::new(),
            }),
        }
        debug!("Added {} to cart", key);
        self.publish();
    }

    /// Removes one configured line entirely.
    pub fn remove_line(&mut self, item_id: &str, configuration: &ItemConfiguration) {
        let key = line_key(item_id, configuration);
        self.lines.retain(|line| line.key() != key);
        self.publish();
    }

    /// Removes every configuration of an item.
    pub fn remove_item(&mut self, item_id: &str) {
        self.lines.retain(|line| line.item.id != item_id);
        self.publish();
    }

    /// Sets the quantity of a configured line; `quantity <= 0` removes it.
    ///
    /// Setting a positive quantity on a line not in the cart is a no-op, since there is
    /// no menu item to build it from.
    pub fn update_line_quantity(
        &mut self,
        item_id: &str,
        configuration: &ItemConfiguration,
        quantity: i64,
    ) {
        let key = line_key(item_id, configuration);
        match clamp_quantity(quantity) {
            0 => self.lines.retain(|line| line.key() != key),
            q => {
                if let Some(line) = self.lines.iter_mut().find(|line| line.key() == key) {
                    line.quantity = q;
                }
            }
        }
        self.publish();
    }

    /// Sets the quantity of the default-configuration line of `item`, creating it if needed.
    pub fn update_quantity(&mut self, item: &MenuItem, quantity: i64) {
        let configuration = item.default_configuration();
        let key = line_key(&item.id, &configuration);
        match clamp_quantity(quantity) {
            0 => self.lines.retain(|line| line.key() != key),
            q => match self.lines.iter_mut().find(|line| line.key() == key) {
                Some(line) => line.quantity = q,
                None => self.lines.push(CartLine {
                    item: item.clone(),
                    configuration,
                    quantity: q,
                    note: String::new(),
                }),
            },
        }
        self.publish();
    }

    /// Attaches a free-text note to a configured line. Returns false if the line is absent.
    pub fn set_item_note(
        &mut self,
        item_id: &str,
        configuration: &ItemConfiguration,
        note: &str,
    ) -> bool {
        let key = line_key(item_id, configuration);
        let Some(line) = self.lines.iter_mut().find(|line| line.key() == key) else {
            return false;
        };
        line.note = note.trim().to_string();
        self.publish();
        true
    }

    /// Sets the order-level instructions passed on to the delivery order.
    pub fn set_order_instructions(&mut self, instructions: &str) {
        self.order_instructions = instructions.to_string();
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_order_instructions(&self.order_instructions) {
                warn!("Failed to persist order instructions: {}", e);
            }
        }
    }

    /// Empties the cart (and therefore clears any promo).
    pub fn clear(&mut self) {
        self.lines.clear();
        self.publish();
    }

    // --- Queries ---

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total quantity across all configurations of `item_id`.
    #[must_use]
    pub fn quantity(&self, item_id: &str) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.item.id == item_id)
            .map(|line| line.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Quantity of one configured line.
    #[must_use]
    pub fn line_quantity(&self, item_id: &str, configuration: &ItemConfiguration) -> u32 {
        let key = line_key(item_id, configuration);
        self.lines
            .iter()
            .find(|line| line.key() == key)
            .map_or(0, |line| line.quantity)
    }

    /// The line with an empty configuration for `item_id`, if present.
    #[must_use]
    pub fn default_line(&self, item_id: &str) -> Option<&CartLine> {
        let key = line_key(item_id, &ItemConfiguration::default());
        self.lines.iter().find(|line| line.key() == key)
    }

    #[must_use]
    pub fn order_instructions(&self) -> &str {
        &self.order_instructions
    }

    #[must_use]
    pub fn applied_promo(&self) -> Option<&AppliedPromo> {
        self.applied_promo.as_ref()
    }

    #[must_use]
    pub fn fee_settings(&self) -> &FeeSettings {
        &self.fees
    }

    // --- Pricing ---

    /// Applies a promo code. Only one promo is active at a time; a rejected code leaves
    /// the current promo untouched.
    pub fn apply_promo_code(&mut self, raw_code: &str) -> PromoApplyResult {
        if self.lines.is_empty() {
            return PromoApplyResult::CartEmpty;
        }

        let code = pricing::normalize_code(raw_code);
        if code.is_empty() {
            return PromoApplyResult::Invalid;
        }

        let Some(promo) = self.promos.validate(&code) else {
            info!("Rejected promo code {}", code);
            return PromoApplyResult::InvalidOrExpired;
        };

        info!("Applied promo code {}", promo.code);
        self.applied_promo = Some(promo);
        self.persist_promo();
        PromoApplyResult::Applied
    }

    /// Removes any active promo.
    pub fn remove_promo(&mut self) {
        self.applied_promo = None;
        self.persist_promo();
    }

    /// Replaces and persists the fee settings.
    pub fn set_fee_settings(&mut self, settings: FeeSettings) {
        self.fees = settings;
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_cart_fee_settings(&self.fees) {
                warn!("Failed to persist fee settings: {}", e);
            }
        }
    }

    #[must_use]
    pub fn subtotal_cents(&self) -> i64 {
        pricing::subtotal_cents(&self.lines)
    }

    #[must_use]
    pub fn discount_cents(&self) -> i64 {
        pricing::discount_cents(self.subtotal_cents(), self.applied_promo.as_ref())
    }

    #[must_use]
    pub fn delivery_fee_cents(&self) -> i64 {
        if self.lines.is_empty() {
            0
        } else {
            self.fees.delivery_fee_cents
        }
    }

    #[must_use]
    pub fn service_fee_cents(&self) -> i64 {
        if self.lines.is_empty() {
            0
        } else {
            self.fees.service_fee_cents
        }
    }

    #[must_use]
    pub fn tax_cents(&self) -> i64 {
        if self.lines.is_empty() {
            return 0;
        }
        pricing::tax_cents(self.subtotal_cents() - self.discount_cents(), self.fees.tax_rate)
    }

    #[must_use]
    pub fn total_cents(&self) -> i64 {
        self.totals().total_cents
    }

    /// Full pricing breakdown.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        pricing::compute_totals(&self.lines, self.applied_promo.as_ref(), &self.fees)
    }

    // --- Persistence ---

    fn publish(&mut self) {
        if self.lines.is_empty() && self.applied_promo.is_some() {
            debug!("Cart emptied, clearing promo");
            self.applied_promo = None;
            self.persist_promo();
        }
        self.persist_lines();
    }

    fn persist_promo(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_cart_promo(self.applied_promo.as_ref()) {
                warn!("Failed to persist cart promo: {}", e);
            }
        }
    }

    fn persist_lines(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let stored: Vec<StoredCartLine> = self.lines.iter().map(stored_from_line).collect();
        if let Err(e) = storage.save_cart_lines(&stored) {
            warn!("Failed to persist cart lines: {}", e);
        }
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

fn stored_from_line(line: &CartLine) -> StoredCartLine {
    StoredCartLine {
        item_id: line.item.id.clone(),
        restaurant_id: line.item.restaurant_id.clone(),
        category_id: line.item.category_id.clone(),
        name: line.item.name.clone(),
        description: line.item.description.clone(),
        price_cents: line.item.price_cents,
        is_veg: line.item.is_veg,
        quantity: line.quantity,
        configuration_key: line.configuration.stable_key(),
        selected_variants: line.configuration.encoded_variants(),
        selected_add_ons: line.configuration.encoded_add_ons(),
        item_note: line.note.clone(),
    }
}

fn menu_item_from_stored(stored: &StoredCartLine) -> MenuItem {
    MenuItem {
        id: stored.item_id.clone(),
        restaurant_id: stored.restaurant_id.clone(),
        category_id: stored.category_id.clone(),
        name: stored.name.clone(),
        description: stored.description.clone(),
        price_cents: stored.price_cents,
        is_veg: stored.is_veg,
        variant_groups: Vec::new(),
        add_on_groups: Vec::new(),
    }
}
