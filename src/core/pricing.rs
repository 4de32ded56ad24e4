//! Cart pricing arithmetic.
//!
//! All amounts are integer cents. The functions here are pure; [`crate::core::cart::Cart`]
//! feeds them its lines, active promo and fee settings.
//!
//! ```text
//! subtotal = Σ (base price + option deltas) × quantity
//! discount = clamp(promo(subtotal), 0, subtotal)
//! tax      = round((subtotal − discount) × tax rate)
//! total    = max(0, subtotal − discount + delivery fee + service fee + tax)
//! ```

use crate::models::CartLine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default flat delivery fee in cents.
pub const DEFAULT_DELIVERY_FEE_CENTS: i64 = 199;
/// Default flat service fee in cents.
pub const DEFAULT_SERVICE_FEE_CENTS: i64 = 99;
/// Default tax rate applied to the discounted subtotal.
pub const DEFAULT_TAX_RATE: f64 = 0.08;

/// How a promo reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    /// `value` is a percentage, e.g. 10 for 10 %
    PercentOff,
    /// `value` is a flat amount in cents
    FixedCentsOff,
}

impl PromoKind {
    /// Persisted name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PercentOff => "PERCENT_OFF",
            Self::FixedCentsOff => "FIXED_CENTS_OFF",
        }
    }

    /// Parses a persisted name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PERCENT_OFF" => Some(Self::PercentOff),
            "FIXED_CENTS_OFF" => Some(Self::FixedCentsOff),
            _ => None,
        }
    }
}

/// The promo currently active on the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromo {
    pub code: String,
    pub kind: PromoKind,
    pub value: i64,
}

/// Flat fees and tax rate, charged only for a non-empty cart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSettings {
    pub delivery_fee_cents: i64,
    pub service_fee_cents: i64,
    pub tax_rate: f64,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            delivery_fee_cents: DEFAULT_DELIVERY_FEE_CENTS,
            service_fee_cents: DEFAULT_SERVICE_FEE_CENTS,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

/// Full pricing breakdown of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub delivery_fee_cents: i64,
    pub service_fee_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Outcome of applying a promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoApplyResult {
    Applied,
    CartEmpty,
    Invalid,
    InvalidOrExpired,
}

/// A promo code the shop knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoDefinition {
    pub code: String,
    pub kind: PromoKind,
    pub value: i64,
    #[serde(default)]
    pub expired: bool,
}

/// Lookup of known promo codes, keyed by upper-cased code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoBook {
    promos: BTreeMap<String, PromoDefinition>,
}

impl Default for PromoBook {
    /// `SAVE10` (10 % off), `SAVE5` ($5.00 off), `FREESHIP` ($1.99 off) and an expired `EXPIRED`.
    fn default() -> Self {
        Self::new([
            PromoDefinition {
                code: "SAVE10".to_string(),
                kind: PromoKind::PercentOff,
                value: 10,
                expired: false,
            },
            PromoDefinition {
                code: "SAVE5".to_string(),
                kind: PromoKind::FixedCentsOff,
                value: 500,
                expired: false,
            },
            PromoDefinition {
                code: "FREESHIP".to_string(),
                kind: PromoKind::FixedCentsOff,
                value: DEFAULT_DELIVERY_FEE_CENTS,
                expired: false,
            },
            PromoDefinition {
                code: "EXPIRED".to_string(),
                kind: PromoKind::FixedCentsOff,
                value: 0,
                expired: true,
            },
        ])
    }
}

impl PromoBook {
    pub fn new<I: IntoIterator<Item = PromoDefinition>>(definitions: I) -> Self {
        let promos = definitions
            .into_iter()
            .map(|definition| (normalize_code(&definition.code), definition))
            .collect();
        Self { promos }
    }

    /// Validates an already-normalized code. Unknown and expired codes yield `None`.
    #[must_use]
    pub fn validate(&self, code: &str) -> Option<AppliedPromo> {
        let definition = self.promos.get(code).filter(|d| !d.expired)?;
        Some(AppliedPromo {
            code: code.to_string(),
            kind: definition.kind,
            value: definition.value,
        })
    }

    pub fn len(&self) -> usize {
        self.promos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promos.is_empty()
    }
}

/// Trims and upper-cases a user-entered code.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Σ unit price × quantity over all lines.
#[must_use]
pub fn subtotal_cents(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .map(|line| line.unit_price_cents().saturating_mul(i64::from(line.quantity)))
        .fold(0, i64::saturating_add)
}

/// Discount for `promo` on `subtotal`, clamped to `[0, subtotal]`.
#[must_use]
pub fn discount_cents(subtotal: i64, promo: Option<&AppliedPromo>) -> i64 {
    let Some(promo) = promo else {
        return 0;
    };
    let raw = match promo.kind {
        PromoKind::PercentOff => percent_of(subtotal, promo.value.clamp(0, 100)),
        PromoKind::FixedCentsOff => promo.value,
    };
    raw.clamp(0, subtotal.max(0))
}

/// Tax on the discounted subtotal, rounded half-up to the cent.
#[must_use]
pub fn tax_cents(taxable_cents: i64, tax_rate: f64) -> i64 {
    let base = taxable_cents.max(0);
    // Cast safety: cart amounts are far below 2^52 cents, so the f64 round-trip is exact.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let tax = (base as f64 * tax_rate).round() as i64;
    tax.max(0)
}

/// Computes the full breakdown for a set of lines.
#[must_use]
pub fn compute_totals(
    lines: &[CartLine],
    promo: Option<&AppliedPromo>,
    fees: &FeeSettings,
) -> CartTotals {
    if lines.is_empty() {
        return CartTotals::default();
    }

    let item_count = lines
        .iter()
        .map(|line| line.quantity)
        .fold(0, u32::saturating_add);
    let subtotal = subtotal_cents(lines);
    let discount = discount_cents(subtotal, promo);
    let taxable = subtotal - discount;
    let tax = tax_cents(taxable, fees.tax_rate);
    let total = taxable
        .saturating_add(fees.delivery_fee_cents)
        .saturating_add(fees.service_fee_cents)
        .saturating_add(tax)
        .max(0);

    CartTotals {
        item_count,
        subtotal_cents: subtotal,
        discount_cents: discount,
        delivery_fee_cents: fees.delivery_fee_cents,
        service_fee_cents: fees.service_fee_cents,
        tax_cents: tax,
        total_cents: total,
    }
}

/// `percent`% of `amount`, rounded half away from zero.
fn percent_of(amount: i64, percent: i64) -> i64 {
    let scaled = round_div(i128::from(amount) * i128::from(percent), 100);
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn percent(value: i64) -> AppliedPromo {
        AppliedPromo {
            code: "P".to_string(),
            kind: PromoKind::PercentOff,
            value,
        }
    }

    fn fixed(value: i64) -> AppliedPromo {
        AppliedPromo {
            code: "F".to_string(),
            kind: PromoKind::FixedCentsOff,
            value,
        }
    }

    #[test]
    fn test_save10_on_twenty_dollars_is_two_dollars() {
        let book = PromoBook::default();
        let promo = book.validate("SAVE10").unwrap_or_else(|| percent(0));
        assert_eq!(discount_cents(2000, Some(&promo)), 200);
    }

    #[test]
    fn test_percent_discount_rounds_half_up() {
        // 10% of 1995 = 199.5 -> 200
        assert_eq!(discount_cents(1995, Some(&percent(10))), 200);
        // 10% of 1994 = 199.4 -> 199
        assert_eq!(discount_cents(1994, Some(&percent(10))), 199);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        assert_eq!(discount_cents(300, Some(&fixed(500))), 300);
        assert_eq!(discount_cents(300, Some(&percent(150))), 300);
        assert_eq!(discount_cents(300, Some(&fixed(-50))), 0);
        assert_eq!(discount_cents(0, Some(&fixed(500))), 0);
        assert_eq!(discount_cents(300, None), 0);
    }

    #[test]
    fn test_huge_amounts_saturate_instead_of_overflowing() {
        assert_eq!(discount_cents(i64::MAX, Some(&percent(i64::MAX))), i64::MAX);
        assert_eq!(discount_cents(i64::MAX, Some(&percent(50))), i64::MAX / 2 + 1);
        assert_eq!(discount_cents(1000, Some(&percent(i64::MAX))), 1000);

        let item = plain_item("caviar", i64::MAX / 2);
        let lines = vec![line(&item, u32::MAX), line(&plain_item("tea", 250), u32::MAX)];
        let fees = FeeSettings {
            tax_rate: 0.0,
            ..FeeSettings::default()
        };
        let totals = compute_totals(&lines, None, &fees);
        assert_eq!(totals.item_count, u32::MAX);
        assert_eq!(totals.subtotal_cents, i64::MAX);
        assert_eq!(totals.total_cents, i64::MAX);
    }

    #[test]
    fn test_tax_rounds_to_nearest_cent() {
        assert_eq!(tax_cents(1800, 0.08), 144);
        assert_eq!(tax_cents(1006, 0.08), 80); // 80.48
        assert_eq!(tax_cents(1019, 0.08), 82); // 81.52
        assert_eq!(tax_cents(-10, 0.08), 0);
    }

    #[test]
    fn test_compute_totals_full_breakdown() {
        let lines = vec![line(&plain_item("burger", 1000), 2)];
        let totals = compute_totals(&lines, Some(&percent(10)), &FeeSettings::default());

        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.subtotal_cents, 2000);
        assert_eq!(totals.discount_cents, 200);
        assert_eq!(totals.delivery_fee_cents, 199);
        assert_eq!(totals.service_fee_cents, 99);
        assert_eq!(totals.tax_cents, 144);
        assert_eq!(totals.total_cents, 2000 - 200 + 199 + 99 + 144);
    }

    #[test]
    fn test_compute_totals_includes_option_deltas() {
        let item = sample_configurable_item();
        let mut configured_line = line(&item, 3);
        configured_line.configuration = configured(&[("size", "size_large")], &["cheese"]);
        // (1000 + 250 + 100) * 3
        assert_eq!(subtotal_cents(&[configured_line]), 4050);
    }

    #[test]
    fn test_empty_cart_has_no_fees() {
        let totals = compute_totals(&[], Some(&fixed(500)), &FeeSettings::default());
        assert_eq!(totals, CartTotals::default());
    }

    #[test]
    fn test_total_is_floored_at_zero() {
        let fees = FeeSettings {
            delivery_fee_cents: -5000,
            service_fee_cents: 0,
            tax_rate: 0.0,
        };
        let lines = vec![line(&plain_item("tea", 100), 1)];
        assert_eq!(compute_totals(&lines, None, &fees).total_cents, 0);
    }

    #[test]
    fn test_promo_book_rejects_unknown_and_expired() {
        let book = PromoBook::default();
        assert!(book.validate("EXPIRED").is_none());
        assert!(book.validate("BOGUS").is_none());
        assert_eq!(
            book.validate("FREESHIP").map(|p| (p.kind, p.value)),
            Some((PromoKind::FixedCentsOff, 199))
        );
        assert_eq!(book.len(), 4);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
        assert_eq!(normalize_code("   "), "");
    }
}
