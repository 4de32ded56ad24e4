//! Local ratings and reviews for restaurants and menu items.
//!
//! Reviews and per-target aggregates are persisted as two separate values. When the
//! aggregates are missing or unreadable they are rebuilt from the reviews.

use crate::{
    core::delivery::Clock,
    errors::{Error, Result},
    storage::PreferencesStorage,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewTargetType {
    Restaurant,
    MenuItem,
}

impl ReviewTargetType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "RESTAURANT",
            Self::MenuItem => "MENU_ITEM",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "RESTAURANT" => Some(Self::Restaurant),
            "MENU_ITEM" => Some(Self::MenuItem),
            _ => None,
        }
    }
}

/// What a review is about.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReviewTarget {
    pub kind: ReviewTargetType,
    pub id: String,
}

impl ReviewTarget {
    pub fn new(kind: ReviewTargetType, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn restaurant(id: impl Into<String>) -> Self {
        Self::new(ReviewTargetType::Restaurant, id)
    }

    pub fn menu_item(id: impl Into<String>) -> Self {
        Self::new(ReviewTargetType::MenuItem, id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub target: ReviewTarget,
    pub author_name: String,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Average (one decimal) and number of reviews for a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: u32,
}

/// Fields of a review being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub author_name: String,
    pub rating: u8,
    pub text: String,
}

/// Partial edit; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub author_name: Option<String>,
    pub rating: Option<u8>,
    pub text: Option<String>,
}

pub struct Ratings {
    storage: PreferencesStorage,
    clock: Arc<dyn Clock>,
    reviews: BTreeMap<String, Review>,
    aggregates: BTreeMap<ReviewTarget, RatingAggregate>,
}

impl std::fmt::Debug for Ratings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ratings")
            .field("reviews", &self.reviews.len())
            .field("aggregates", &self.aggregates.len())
            .finish_non_exhaustive()
    }
}

impl Ratings {
    /// Loads persisted reviews and aggregates.
    pub fn load(storage: PreferencesStorage, clock: Arc<dyn Clock>) -> Self {
        let reviews: BTreeMap<String, Review> = storage
            .load_reviews()
            .into_iter()
            .map(|review| (review.id.clone(), review))
            .collect();

        let mut ratings = Self {
            aggregates: storage.load_rating_aggregates(),
            storage,
            clock,
            reviews,
        };
        if ratings.aggregates.is_empty() && !ratings.reviews.is_empty() {
            info!("Rebuilding rating aggregates from {} reviews", ratings.reviews.len());
            ratings.recompute_all();
        }
        ratings
    }

    /// Adds a review after validating the author and rating.
    pub fn add_review(&mut self, target: ReviewTarget, draft: ReviewDraft) -> Result<Review> {
        let author_name = validate(&draft.author_name, draft.rating)?;
        let now = self.clock.now();
        let review = Review {
            id: Uuid::new_v4().to_string(),
            target,
            author_name,
            rating: draft.rating,
            text: draft.text,
            created_at: now,
            updated_at: now,
        };

        info!(
            "Added {}-star review for {} {}",
            review.rating,
            review.target.kind.as_str(),
            review.target.id
        );
        self.reviews.insert(review.id.clone(), review.clone());
        self.recompute(&review.target);
        self.persist();
        Ok(review)
    }

    /// Applies a partial update to an existing review.
    pub fn update_review(&mut self, review_id: &str, changes: ReviewUpdate) -> Result<Review> {
        let now = self.clock.now();
        let existing = self
            .reviews
            .get_mut(review_id)
            .ok_or_else(|| Error::ReviewNotFound {
                id: review_id.to_string(),
            })?;

        let rating = changes.rating.unwrap_or(existing.rating);
        let author = changes
            .author_name
            .unwrap_or_else(|| existing.author_name.clone());
        existing.author_name = validate(&author, rating)?;
        existing.rating = rating;
        if let Some(text) = changes.text {
            existing.text = text;
        }
        existing.updated_at = now;

        let updated = existing.clone();
        self.recompute(&updated.target);
        self.persist();
        Ok(updated)
    }

    /// Deletes a review.
    pub fn delete_review(&mut self, review_id: &str) -> Result<()> {
        let removed = self
            .reviews
            .remove(review_id)
            .ok_or_else(|| Error::ReviewNotFound {
                id: review_id.to_string(),
            })?;
        self.recompute(&removed.target);
        self.persist();
        Ok(())
    }

    /// Reviews for a target, newest first.
    #[must_use]
    pub fn reviews_for(&self, target: &ReviewTarget) -> Vec<&Review> {
        let mut reviews: Vec<&Review> = self
            .reviews
            .values()
            .filter(|review| &review.target == target)
            .collect();
        reviews.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        reviews
    }

    #[must_use]
    pub fn aggregate(&self, target: &ReviewTarget) -> Option<RatingAggregate> {
        self.aggregates.get(target).copied()
    }

    fn recompute_all(&mut self) {
        let targets: Vec<ReviewTarget> = self
            .reviews
            .values()
            .map(|review| review.target.clone())
            .collect();
        self.aggregates.clear();
        for target in targets {
            self.recompute(&target);
        }
    }

    fn recompute(&mut self, target: &ReviewTarget) {
        let ratings: Vec<u32> = self
            .reviews
            .values()
            .filter(|review| &review.target == target)
            .map(|review| u32::from(review.rating))
            .collect();
        if ratings.is_empty() {
            self.aggregates.remove(target);
            return;
        }

        let count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
        let average = f64::from(ratings.iter().sum::<u32>()) / f64::from(count);
        self.aggregates.insert(
            target.clone(),
            RatingAggregate {
                average: (average * 10.0).round() / 10.0,
                count,
            },
        );
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save_reviews(self.reviews.values()) {
            warn!("Failed to persist reviews: {}", e);
        }
        if let Err(e) = self.storage.save_rating_aggregates(&self.aggregates) {
            warn!("Failed to persist rating aggregates: {}", e);
        }
    }
}

fn validate(author_name: &str, rating: u8) -> Result<String> {
    let author = author_name.trim();
    if author.is_empty() {
        return Err(Error::InvalidReview {
            reason: "author name is required".to_string(),
        });
    }
    if !(1..=5).contains(&rating) {
        return Err(Error::InvalidReview {
            reason: format!("rating must be between 1 and 5, got {rating}"),
        });
    }
    Ok(author.to_string())
}
