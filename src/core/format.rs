//! Display formatting for prices, ratings, ETAs, countdowns and receipts.

use crate::core::{
    cart::Cart,
    delivery::{DeliveryStage, StoredDeliveryOrder},
    pricing::CartTotals,
};
use crate::models::{Restaurant, configuration_summary};
use std::time::Duration;

/// Formats integer cents as dollars.
///
/// # Arguments
/// * `cents` - Amount in cents, may be negative
///
/// # Returns
/// Formatted string like "$12.50" or "-$0.99"
#[must_use]
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// "★ 4.2"
#[must_use]
pub fn format_rating(rating: f64) -> String {
    format!("★ {rating:.1}")
}

/// "25–35 min", or "25 min" when both bounds agree.
#[must_use]
pub fn format_eta(restaurant: &Restaurant) -> String {
    let (min, max) = (restaurant.eta_minutes_min, restaurant.eta_minutes_max);
    if min == max {
        format!("{min} min")
    } else {
        format!("{}–{} min", min.min(max), min.max(max))
    }
}

/// Formats a countdown as `mm:ss`, rounding partial seconds up.
#[must_use]
pub fn format_countdown(remaining: Duration) -> String {
    let mut secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs += 1;
    }
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Formats the pricing breakdown of a cart.
///
/// # Returns
/// One `label: amount` row per component, discount and fee rows only when non-zero
#[must_use]
pub fn format_totals(totals: &CartTotals) -> String {
    let mut rows = vec![format!(
        "Subtotal ({} items): {}",
        totals.item_count,
        format_money(totals.subtotal_cents)
    )];
    if totals.discount_cents > 0 {
        rows.push(format!("Discount: -{}", format_money(totals.discount_cents)));
    }
    if totals.delivery_fee_cents != 0 {
        rows.push(format!("Delivery fee: {}", format_money(totals.delivery_fee_cents)));
    }
    if totals.service_fee_cents != 0 {
        rows.push(format!("Service fee: {}", format_money(totals.service_fee_cents)));
    }
    rows.push(format!("Tax: {}", format_money(totals.tax_cents)));
    rows.push(format!("Total: {}", format_money(totals.total_cents)));
    rows.join("\n")
}

/// Formats the cart as a receipt: one row per line (with its options and note) followed
/// by the totals.
#[must_use]
pub fn format_cart_receipt(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut rows = Vec::new();
    for line in cart.lines() {
        let line_total = line.unit_price_cents().saturating_mul(i64::from(line.quantity));
        rows.push(format!("{}x {}: {}", line.quantity, line.item.name, format_money(line_total)));
        let options = configuration_summary(&line.item, &line.configuration);
        if !options.is_empty() {
            rows.push(format!("   {options}"));
        }
        if !line.note.is_empty() {
            rows.push(format!("   Note: {}", line.note));
        }
    }
    if let Some(promo) = cart.applied_promo() {
        rows.push(format!("Promo: {}", promo.code));
    }
    rows.push(format_totals(&cart.totals()));
    rows.join("\n")
}

/// One-line status of an order, e.g. "ORD-123456 · Burger Barn · Preparing (next in 00:12)".
#[must_use]
pub fn format_order_status(order: &StoredDeliveryOrder, remaining: Option<Duration>) -> String {
    let status = format!(
        "{} · {} · {}",
        order.id,
        order.restaurant_name,
        order.current_stage.label()
    );
    match remaining.filter(|_| !order.current_stage.is_terminal()) {
        Some(remaining) => format!("{status} (next in {})", format_countdown(remaining)),
        None => status,
    }
}

/// Stage progress as a row of markers, filled up to the current stage.
#[must_use]
pub fn format_stage_progress(current: DeliveryStage) -> String {
    DeliveryStage::ALL
        .iter()
        .map(|stage| if *stage <= current { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join("─")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pricing::{FeeSettings, PromoBook};
    use crate::test_utils::*;
    use chrono::DateTime;
    use std::collections::BTreeMap;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "$0.00");
        assert_eq!(format_money(5), "$0.05");
        assert_eq!(format_money(1250), "$12.50");
        assert_eq!(format_money(-99), "-$0.99");
    }

    #[test]
    fn test_format_rating_and_eta() {
        assert_eq!(format_rating(4.24), "★ 4.2");
        assert_eq!(format_rating(5.0), "★ 5.0");

        let catalog = sample_catalog();
        let restaurant = catalog.restaurant_by_id("burger_barn");
        assert_eq!(restaurant.map(format_eta).as_deref(), Some("25–35 min"));
    }

    #[test]
    fn test_format_countdown_rounds_up() {
        assert_eq!(format_countdown(Duration::from_secs(0)), "00:00");
        assert_eq!(format_countdown(Duration::from_millis(12_001)), "00:13");
        assert_eq!(format_countdown(Duration::from_secs(95)), "01:35");
    }

    #[test]
    fn test_format_totals_skips_zero_rows() {
        let totals = CartTotals {
            item_count: 2,
            subtotal_cents: 2000,
            discount_cents: 0,
            delivery_fee_cents: 199,
            service_fee_cents: 0,
            tax_cents: 160,
            total_cents: 2359,
        };
        assert_eq!(
            format_totals(&totals),
            "Subtotal (2 items): $20.00\nDelivery fee: $1.99\nTax: $1.60\nTotal: $23.59"
        );
    }

    #[test]
    fn test_receipt_lists_options_and_totals() {
        let mut cart = Cart::new(FeeSettings::default(), PromoBook::default());
        let item = sample_configurable_item();
        let config = configured(&[("size", "size_large")], &["salsa"]);
        cart.add_configured(&item, config.clone());
        cart.set_item_note(&item.id, &config, "no beans");
        cart.apply_promo_code("SAVE10");

        let receipt = format_cart_receipt(&cart);
        assert!(receipt.contains("1x Burrito: $13.25"), "{receipt}");
        assert!(receipt.contains("Size: Large • Add-ons: Salsa"), "{receipt}");
        assert!(receipt.contains("Note: no beans"));
        assert!(receipt.contains("Promo: SAVE10"));
        assert!(receipt.contains("Discount: -$1.33"));
        assert!(receipt.ends_with(&format!("Total: {}", format_money(cart.total_cents()))));
        assert!(!receipt.contains('\u{2014}'));

        assert_eq!(
            format_cart_receipt(&Cart::new(FeeSettings::default(), PromoBook::default())),
            "Your cart is empty."
        );
    }

    #[test]
    fn test_order_status_and_progress() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default();
        let mut order = StoredDeliveryOrder {
            id: "ORD-000000".to_string(),
            restaurant_name: "Burger Barn".to_string(),
            items_summary: "1x burger".to_string(),
            created_at: at,
            current_stage: DeliveryStage::Preparing,
            stage_timestamps: BTreeMap::from([(DeliveryStage::Placed, at)]),
            next_transition_at: Some(at),
            instructions: String::new(),
        };
        assert_eq!(
            format_order_status(&order, Some(Duration::from_secs(12))),
            "ORD-000000 · Burger Barn · Preparing (next in 00:12)"
        );
        assert_eq!(format_stage_progress(order.current_stage), "●─●─●─○─○");

        order.current_stage = DeliveryStage::Delivered;
        assert_eq!(
            format_order_status(&order, Some(Duration::from_secs(3))),
            "ORD-000000 · Burger Barn · Delivered"
        );
    }
}
