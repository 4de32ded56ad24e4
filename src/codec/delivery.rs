//! Active delivery order snapshot encoding.
//!
//! `id|restaurantName|itemsSummary|createdAtMs|STAGE|nextTransitionAtMs|timeline|instructions`
//!
//! `nextTransitionAtMs` is `-1` when no transition is pending and `timeline` is a
//! comma-delimited list of `STAGE=timestampMs` entries. Snapshots written before order
//! instructions existed have seven fields and decode with empty instructions.

use super::{FIELD_SEP, LINE_SEP, index_of_unescaped, join_fields, split_escaped, split_fields, unescape};
use crate::core::delivery::{DeliveryStage, StoredDeliveryOrder};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const KV_SEP: char = '=';
const LIST_SEP: char = ',';
const RESERVED: &[char] = &[FIELD_SEP, LINE_SEP, LIST_SEP, KV_SEP];
const LEGACY_FIELD_COUNT: usize = 7;

/// Encodes an order snapshot.
#[must_use]
pub fn encode(order: &StoredDeliveryOrder) -> String {
    let timeline = order
        .stage_timestamps
        .iter()
        .map(|(stage, at)| format!("{}{KV_SEP}{}", stage.as_str(), at.timestamp_millis()))
        .collect::<Vec<_>>()
        .join(&LIST_SEP.to_string());

    let created_at = order.created_at.timestamp_millis().to_string();
    let next_at = order
        .next_transition_at
        .map_or(-1, |at| at.timestamp_millis())
        .to_string();

    let fields: [&str; 8] = [
        &order.id,
        &order.restaurant_name,
        &order.items_summary,
        &created_at,
        order.current_stage.as_str(),
        &next_at,
        &timeline,
        &order.instructions,
    ];
    join_fields(fields, RESERVED)
}

/// Decodes an order snapshot, or `None` when missing or malformed.
#[must_use]
pub fn decode(encoded: Option<&str>) -> Option<StoredDeliveryOrder> {
    let encoded = encoded.filter(|e| !e.trim().is_empty())?;

    let fields = split_fields(encoded);
    if fields.len() < LEGACY_FIELD_COUNT {
        return None;
    }

    let id = fields[0].trim();
    if id.is_empty() {
        return None;
    }
    let created_at = millis_to_datetime(fields[3].trim().parse::<i64>().ok()?)?;
    let current_stage = DeliveryStage::parse(fields[4].trim())?;
    let next_raw = fields[5].trim().parse::<i64>().ok()?;
    let next_transition_at = if next_raw > 0 {
        Some(millis_to_datetime(next_raw)?)
    } else {
        None
    };

    Some(StoredDeliveryOrder {
        id: id.to_string(),
        restaurant_name: fields[1].clone(),
        items_summary: fields[2].clone(),
        created_at,
        current_stage,
        stage_timestamps: decode_timeline(&fields[6]),
        next_transition_at,
        instructions: fields.get(7).cloned().unwrap_or_default(),
    })
}

fn decode_timeline(raw: &str) -> BTreeMap<DeliveryStage, DateTime<Utc>> {
    split_escaped(raw, LIST_SEP)
        .iter()
        .filter_map(|token| {
            let token = token.trim();
            let idx = index_of_unescaped(token, KV_SEP)?;
            if idx == 0 || idx + 1 >= token.len() {
                return None;
            }
            let stage = DeliveryStage::parse(&unescape(&token[..idx]))?;
            let millis = unescape(&token[idx + 1..]).parse::<i64>().ok()?;
            Some((stage, millis_to_datetime(millis)?))
        })
        .collect()
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}
