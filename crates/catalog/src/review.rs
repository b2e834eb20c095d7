//! Customer reviews and the derived rating summary.
//!
//! `average_rating`, `total_reviews` and the star histogram are **derived
//! fields**: they are recomputed from the full review list on every review
//! mutation and carried inside the emitted event, never set directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{DomainError, DomainResult, UserId, ValueObject};

/// A single customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Reviewer identity; absent for anonymous reviews.
    pub user_id: Option<UserId>,
    pub user_name: String,
    /// Star rating, 1–5 inclusive.
    pub rating: u8,
    pub title: String,
    pub comment: String,
    /// Whether the reviewer is a verified purchaser.
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Rating must be within 1–5.
    pub fn validate(&self) -> DomainResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(DomainError::validation(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        Ok(())
    }
}

impl ValueObject for Review {}

/// Derived rating aggregate over a review list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal (half away from zero).
    pub average_rating: f64,
    pub total_reviews: u32,
    /// Counts per star value; index 0 holds 1-star counts, index 4 holds 5-star.
    pub rating_distribution: [u32; 5],
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self {
            average_rating: 0.0,
            total_reviews: 0,
            rating_distribution: [0; 5],
        }
    }
}

impl RatingSummary {
    /// Recompute the summary from the full review list.
    ///
    /// Reviews with out-of-range ratings are impossible by construction
    /// (`Review::validate` runs before insertion), so no clamping happens here.
    pub fn recompute(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }

        let mut distribution = [0u32; 5];
        let mut sum: u64 = 0;
        for review in reviews {
            sum += u64::from(review.rating);
            distribution[usize::from(review.rating - 1)] += 1;
        }

        let mean = sum as f64 / reviews.len() as f64;
        Self {
            average_rating: (mean * 10.0).round() / 10.0,
            total_reviews: reviews.len() as u32,
            rating_distribution: distribution,
        }
    }

    /// Count of reviews with the given star value (1–5).
    pub fn stars(&self, star: u8) -> u32 {
        debug_assert!((1..=5).contains(&star));
        self.rating_distribution[usize::from(star - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            user_id: None,
            user_name: "tester".to_string(),
            rating,
            title: String::new(),
            comment: String::new(),
            verified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_list_yields_zeroes() {
        let summary = RatingSummary::recompute(&[]);
        assert_eq!(summary, RatingSummary::default());
    }

    #[test]
    fn mean_rounds_to_one_decimal() {
        // [5,5,4,3] -> mean 4.25 -> 4.3 (half away from zero)
        let reviews: Vec<_> = [5, 5, 4, 3].into_iter().map(review).collect();
        let summary = RatingSummary::recompute(&reviews);

        assert_eq!(summary.average_rating, 4.3);
        assert_eq!(summary.total_reviews, 4);
        assert_eq!(summary.rating_distribution, [0, 0, 1, 1, 2]);
        assert_eq!(summary.stars(5), 2);
        assert_eq!(summary.stars(4), 1);
        assert_eq!(summary.stars(3), 1);
        assert_eq!(summary.stars(2), 0);
        assert_eq!(summary.stars(1), 0);
    }

    #[test]
    fn single_review_is_exact() {
        let summary = RatingSummary::recompute(&[review(4)]);
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.total_reviews, 1);
    }

    #[test]
    fn validate_rejects_out_of_range_ratings() {
        assert!(review(0).validate().is_err());
        assert!(review(6).validate().is_err());
        for rating in 1..=5 {
            assert!(review(rating).validate().is_ok());
        }
    }
}
