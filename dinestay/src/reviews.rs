//! Review aggregation.
//!
//! Reviews are embedded in their parent resource, which also carries two derived fields:
//! `ratings` (the mean of all review ratings, 0 when there are none) and `numOfReviews`.
//! The functions here never mutate a loaded resource. They take the current review slice and
//! return a [`ReviewSummary`] holding the new review list together with freshly computed
//! aggregates, which the caller then persists in a single write.
//!
//! A user holds at most one review per resource: [`upsert_review`] overwrites the rating and
//! comment of an existing review instead of appending a second one.

use crate::db::models::resources::Review;
use crate::types::{ReviewId, UserId};
use uuid::Uuid;

/// A review list plus the aggregates derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub reviews: Vec<Review>,
    pub ratings: f64,
    pub num_of_reviews: i32,
}

impl ReviewSummary {
    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        let ratings = average_rating(&reviews);
        let num_of_reviews = reviews.len() as i32;
        Self {
            reviews,
            ratings,
            num_of_reviews,
        }
    }
}

/// A review as submitted by a user.
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub user: UserId,
    pub name: String,
    pub rating: f64,
    pub comment: String,
}

/// Arithmetic mean of all ratings, 0 for an empty list.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: f64 = reviews.iter().map(|r| r.rating).sum();
    total / reviews.len() as f64
}

/// Insert the draft, or overwrite the rating and comment of the user's existing review.
pub fn upsert_review(existing: &[Review], draft: ReviewDraft) -> ReviewSummary {
    let mut reviews = existing.to_vec();

    match reviews.iter_mut().find(|r| r.user == draft.user) {
        Some(review) => {
            review.rating = draft.rating;
            review.comment = draft.comment;
        }
        None => reviews.push(Review {
            id: Uuid::new_v4(),
            user: draft.user,
            name: draft.name,
            rating: draft.rating,
            comment: draft.comment,
        }),
    }

    ReviewSummary::from_reviews(reviews)
}

/// Drop the review with `review_id` (if present) and recompute the aggregates.
pub fn remove_review(existing: &[Review], review_id: ReviewId) -> ReviewSummary {
    let reviews = existing.iter().filter(|r| r.id != review_id).cloned().collect();
    ReviewSummary::from_reviews(reviews)
}
