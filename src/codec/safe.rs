//! Cart, promo, fee settings and string collection encoding.
//!
//! Cart lines (v2) are newline-delimited records of twelve fields:
//! `itemId|restaurantId|categoryId|name|description|priceCents|isVeg|quantity|configurationKey|variantSelections|addOnSelections|itemNote`.
//! Legacy v1 records carry only the first eight fields and are still accepted.

use super::{FIELD_SEP, LINE_SEP, join_fields, parse_bool, records, split_escaped, split_fields, unescape};
use crate::core::pricing::{AppliedPromo, FeeSettings, PromoKind};
use tracing::debug;

const RESERVED: &[char] = &[FIELD_SEP, LINE_SEP];
const V1_FIELD_COUNT: usize = 8;

/// Persisted shape of a cart line. Option groups are not stored; only the selected ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCartLine {
    pub item_id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub is_veg: bool,
    pub quantity: u32,
    pub configuration_key: String,
    pub selected_variants: String,
    pub selected_add_ons: String,
    pub item_note: String,
}

/// Encodes an (unordered) string set.
#[must_use]
pub fn encode_string_set<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut sorted: Vec<&String> = values.into_iter().collect();
    sorted.sort();
    join_fields(sorted, RESERVED)
}

/// Decodes a string set, dropping blank entries.
#[must_use]
pub fn decode_string_set(encoded: Option<&str>) -> std::collections::BTreeSet<String> {
    decode_string_list(encoded).into_iter().collect()
}

/// Encodes an ordered string list.
#[must_use]
pub fn encode_string_list(values: &[String]) -> String {
    join_fields(values, RESERVED)
}

/// Decodes an ordered string list, dropping blank entries.
#[must_use]
pub fn decode_string_list(encoded: Option<&str>) -> Vec<String> {
    let Some(encoded) = encoded.filter(|e| !e.trim().is_empty()) else {
        return Vec::new();
    };
    split_escaped(encoded, FIELD_SEP)
        .iter()
        .map(|part| unescape(part).trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Encodes cart lines as newline-delimited v2 records.
#[must_use]
pub fn encode_cart_lines(lines: &[StoredCartLine]) -> String {
    lines
        .iter()
        .map(|line| {
            let price = line.price_cents.to_string();
            let is_veg = line.is_veg.to_string();
            let quantity = line.quantity.to_string();
            let fields: [&str; 12] = [
                &line.item_id,
                &line.restaurant_id,
                &line.category_id,
                &line.name,
                &line.description,
                &price,
                &is_veg,
                &quantity,
                &line.configuration_key,
                &line.selected_variants,
                &line.selected_add_ons,
                &line.item_note,
            ];
            join_fields(fields, RESERVED)
        })
        .collect::<Vec<_>>()
        .join(&LINE_SEP.to_string())
}

/// Decodes cart lines. Records with too few fields, unparsable numbers, a blank item id
/// or a non-positive quantity are dropped.
#[must_use]
pub fn decode_cart_lines(encoded: Option<&str>) -> Vec<StoredCartLine> {
    let Some(encoded) = encoded else {
        return Vec::new();
    };

    records(encoded)
        .iter()
        .filter_map(|record| {
            let line = decode_cart_line(record);
            if line.is_none() {
                debug!("Dropping malformed cart line record");
            }
            line
        })
        .collect()
}

fn decode_cart_line(record: &str) -> Option<StoredCartLine> {
    let fields = split_fields(record);
    if fields.len() < V1_FIELD_COUNT {
        return None;
    }

    let item_id = fields[0].trim().to_string();
    let price_cents = fields[5].trim().parse::<i64>().ok()?;
    let is_veg = parse_bool(&fields[6])?;
    let quantity = fields[7].trim().parse::<i64>().ok()?;

    if item_id.is_empty() || quantity <= 0 {
        return None;
    }

    let optional = |idx: usize| fields.get(idx).cloned().unwrap_or_default();

    Some(StoredCartLine {
        item_id,
        restaurant_id: fields[1].clone(),
        category_id: fields[2].clone(),
        name: fields[3].clone(),
        description: fields[4].clone(),
        price_cents,
        is_veg,
        quantity: u32::try_from(quantity).ok()?,
        configuration_key: optional(8),
        selected_variants: optional(9),
        selected_add_ons: optional(10),
        item_note: optional(11),
    })
}

/// Encodes the active promo as `code|KIND|value`.
#[must_use]
pub fn encode_applied_promo(promo: &AppliedPromo) -> String {
    let value = promo.value.to_string();
    let fields: [&str; 3] = [&promo.code, promo.kind.as_str(), &value];
    join_fields(fields, RESERVED)
}

/// Decodes a promo, or `None` when missing or malformed.
#[must_use]
pub fn decode_applied_promo(encoded: Option<&str>) -> Option<AppliedPromo> {
    let encoded = encoded.filter(|e| !e.trim().is_empty())?;
    let fields = split_fields(encoded);
    if fields.len() < 3 {
        return None;
    }

    let code = fields[0].trim();
    let kind = PromoKind::parse(fields[1].trim())?;
    let value = fields[2].trim().parse::<i64>().ok()?;
    if code.is_empty() {
        return None;
    }

    Some(AppliedPromo {
        code: code.to_string(),
        kind,
        value,
    })
}

/// Encodes fee settings as `deliveryFeeCents|serviceFeeCents|taxRate`.
#[must_use]
pub fn encode_fee_settings(settings: &FeeSettings) -> String {
    join_fields(
        [
            settings.delivery_fee_cents.to_string(),
            settings.service_fee_cents.to_string(),
            settings.tax_rate.to_string(),
        ],
        RESERVED,
    )
}

/// Decodes fee settings. Negative or non-finite values are rejected.
#[must_use]
pub fn decode_fee_settings(encoded: Option<&str>) -> Option<FeeSettings> {
    let encoded = encoded.filter(|e| !e.trim().is_empty())?;
    let fields = split_fields(encoded);
    if fields.len() < 3 {
        return None;
    }

    let delivery_fee_cents = fields[0].trim().parse::<i64>().ok()?;
    let service_fee_cents = fields[1].trim().parse::<i64>().ok()?;
    let tax_rate = fields[2].trim().parse::<f64>().ok()?;

    if delivery_fee_cents < 0 || service_fee_cents < 0 || !tax_rate.is_finite() || tax_rate < 0.0 {
        return None;
    }

    Some(FeeSettings {
        delivery_fee_cents,
        service_fee_cents,
        tax_rate,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn stored_line(item_id: &str, quantity: u32) -> StoredCartLine {
        StoredCartLine {
            item_id: item_id.to_string(),
            restaurant_id: "r1".to_string(),
            category_id: "c_mains".to_string(),
            name: "Bowl | Large".to_string(),
            description: "line one\nline two".to_string(),
            price_cents: 1299,
            is_veg: true,
            quantity,
            configuration_key: "v{size=large}|a{}".to_string(),
            selected_variants: "size=large".to_string(),
            selected_add_ons: String::new(),
            item_note: r"no onions \ please".to_string(),
        }
    }

    #[test]
    fn test_cart_lines_survive_reserved_characters() {
        let lines = vec![stored_line("i1", 2), stored_line("i2", 1)];
        let decoded = decode_cart_lines(Some(encode_cart_lines(&lines).as_str()));
        assert_eq!(decoded, lines);
    }

    #[test]
    fn test_cart_lines_accept_legacy_v1_records() {
        let decoded = decode_cart_lines(Some("i1|r1|c1|Fries|Crispy|399|false|3"));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].quantity, 3);
        assert_eq!(decoded[0].configuration_key, "");
        assert_eq!(decoded[0].item_note, "");
    }

    #[test]
    fn test_cart_lines_drop_malformed_records() {
        let encoded = [
            "garbage",
            "i1|r1|c1|Fries|Crispy|abc|false|3",
            "i2|r1|c1|Fries|Crispy|399|maybe|3",
            "i3|r1|c1|Fries|Crispy|399|false|0",
            "|r1|c1|Fries|Crispy|399|false|2",
            "i4|r1|c1|Fries|Crispy|399|true|2",
        ]
        .join("\n");
        let decoded = decode_cart_lines(Some(encoded.as_str()));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].item_id, "i4");
    }

    #[test]
    fn test_cart_lines_missing_input_is_empty() {
        assert!(decode_cart_lines(None).is_empty());
        assert!(decode_cart_lines(Some("   ")).is_empty());
        assert!(decode_cart_lines(Some("\\")).is_empty());
    }

    #[test]
    fn test_promo_decoding() {
        let promo = AppliedPromo {
            code: "SAVE10".to_string(),
            kind: PromoKind::PercentOff,
            value: 10,
        };
        assert_eq!(encode_applied_promo(&promo), "SAVE10|PERCENT_OFF|10");
        assert_eq!(decode_applied_promo(Some("SAVE10|PERCENT_OFF|10")), Some(promo));
        assert_eq!(decode_applied_promo(Some("SAVE10|BOGUS|10")), None);
        assert_eq!(decode_applied_promo(Some(" |FIXED_CENTS_OFF|10")), None);
        assert_eq!(decode_applied_promo(Some("SAVE10|PERCENT_OFF")), None);
        assert_eq!(decode_applied_promo(None), None);
    }

    #[test]
    fn test_fee_settings_reject_negative_values() {
        let fees = decode_fee_settings(Some("199|99|0.08")).unwrap();
        assert_eq!(fees.delivery_fee_cents, 199);
        assert_eq!(fees.tax_rate, 0.08);
        assert_eq!(decode_fee_settings(Some("-1|99|0.08")), None);
        assert_eq!(decode_fee_settings(Some("199|99|-0.1")), None);
        assert_eq!(decode_fee_settings(Some("199|99|NaN")), None);
        assert_eq!(decode_fee_settings(Some("199|x|0.08")), None);
    }

    #[test]
    fn test_string_collections() {
        let list = vec!["b".to_string(), "a|b".to_string(), "c".to_string()];
        assert_eq!(decode_string_list(Some(encode_string_list(&list).as_str())), list);

        let set = decode_string_set(Some("x| |y|x"));
        assert_eq!(set.len(), 2);
        assert!(decode_string_set(None).is_empty());
    }
}
