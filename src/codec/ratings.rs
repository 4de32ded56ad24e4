//! Ratings persistence encoding.
//!
//! Reviews: `id|TYPE|targetId|authorName|rating|text|createdAtMs|updatedAtMs`, one per line.
//! Aggregates: `TYPE|targetId|average|count`, one per line.

use super::{FIELD_SEP, LINE_SEP, join_fields, records, split_fields};
use crate::core::ratings::{RatingAggregate, Review, ReviewTarget, ReviewTargetType};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

const RESERVED: &[char] = &[FIELD_SEP, LINE_SEP];

/// Encodes reviews, one record per line.
#[must_use]
pub fn encode_reviews<'a, I>(reviews: I) -> String
where
    I: IntoIterator<Item = &'a Review>,
{
    reviews
        .into_iter()
        .map(|review| {
            let rating = review.rating.to_string();
            let created = review.created_at.timestamp_millis().to_string();
            let updated = review.updated_at.timestamp_millis().to_string();
            let fields: [&str; 8] = [
                &review.id,
                review.target.kind.as_str(),
                &review.target.id,
                &review.author_name,
                &rating,
                &review.text,
                &created,
                &updated,
            ];
            join_fields(fields, RESERVED)
        })
        .collect::<Vec<_>>()
        .join(&LINE_SEP.to_string())
}

/// Decodes reviews, dropping rows with blank ids/author, unknown target types,
/// ratings outside 1..=5 or unparsable timestamps.
#[must_use]
pub fn decode_reviews(encoded: Option<&str>) -> Vec<Review> {
    let Some(encoded) = encoded else {
        return Vec::new();
    };
    records(encoded)
        .iter()
        .filter_map(|record| decode_review(record))
        .collect()
}

fn decode_review(record: &str) -> Option<Review> {
    let fields = split_fields(record);
    if fields.len() < 8 {
        return None;
    }

    let id = fields[0].trim();
    let kind = ReviewTargetType::parse(fields[1].trim())?;
    let target_id = fields[2].trim();
    let author_name = fields[3].trim();
    let rating = fields[4].trim().parse::<u8>().ok()?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(fields[6].trim().parse().ok()?)?;
    let updated_at = DateTime::<Utc>::from_timestamp_millis(fields[7].trim().parse().ok()?)?;

    if id.is_empty() || target_id.is_empty() || author_name.is_empty() {
        return None;
    }
    if !(1..=5).contains(&rating) {
        return None;
    }

    Some(Review {
        id: id.to_string(),
        target: ReviewTarget::new(kind, target_id),
        author_name: author_name.to_string(),
        rating,
        text: fields[5].clone(),
        created_at,
        updated_at,
    })
}

/// Encodes per-target aggregates, one record per line.
#[must_use]
pub fn encode_aggregates(aggregates: &BTreeMap<ReviewTarget, RatingAggregate>) -> String {
    aggregates
        .iter()
        .map(|(target, aggregate)| {
            let average = aggregate.average.to_string();
            let count = aggregate.count.to_string();
            let fields: [&str; 4] = [target.kind.as_str(), &target.id, &average, &count];
            join_fields(fields, RESERVED)
        })
        .collect::<Vec<_>>()
        .join(&LINE_SEP.to_string())
}

/// Decodes aggregates. Averages are clamped to `0.0..=5.0`; malformed rows are skipped.
#[must_use]
pub fn decode_aggregates(encoded: Option<&str>) -> BTreeMap<ReviewTarget, RatingAggregate> {
    let Some(encoded) = encoded else {
        return BTreeMap::new();
    };
    records(encoded)
        .iter()
        .filter_map(|record| {
            let fields = split_fields(record);
            if fields.len() < 4 {
                return None;
            }
            let kind = ReviewTargetType::parse(fields[0].trim())?;
            let target_id = fields[1].trim();
            let average = fields[2].trim().parse::<f64>().ok().filter(|a| a.is_finite())?;
            let count = fields[3].trim().parse::<u32>().ok()?;
            if target_id.is_empty() {
                return None;
            }
            Some((
                ReviewTarget::new(kind, target_id),
                RatingAggregate {
                    average: average.clamp(0.0, 5.0),
                    count,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    fn review(id: &str, rating: u8) -> Review {
        let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        Review {
            id: id.to_string(),
            target: ReviewTarget::new(ReviewTargetType::Restaurant, "r1"),
            author_name: "Sam".to_string(),
            rating,
            text: "Great | fast\nwould order again".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_reviews_survive_reserved_characters() {
        let reviews = vec![review("a", 5), review("b", 3)];
        assert_eq!(decode_reviews(Some(encode_reviews(&reviews).as_str())), reviews);
    }

    #[test]
    fn test_reviews_drop_out_of_range_ratings() {
        let encoded = encode_reviews(&[review("a", 0), review("b", 6), review("c", 4)]);
        let decoded = decode_reviews(Some(encoded.as_str()));
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "c");
    }

    #[test]
    fn test_aggregates_are_clamped_and_filtered() {
        let decoded = decode_aggregates(Some(
            "RESTAURANT|r1|7.5|3\nMENU_ITEM|i1|4.2|1\nPLANET|p|4.0|1\nRESTAURANT|r2|x|1\nRESTAURANT|r3|4.0|-2",
        ));
        assert_eq!(decoded.len(), 2);
        let r1 = &decoded[&ReviewTarget::new(ReviewTargetType::Restaurant, "r1")];
        assert_eq!(r1.average, 5.0);
        assert_eq!(r1.count, 3);
    }

    #[test]
    fn test_missing_input_is_empty() {
        assert!(decode_reviews(None).is_empty());
        assert!(decode_aggregates(Some("")).is_empty());
    }
}
