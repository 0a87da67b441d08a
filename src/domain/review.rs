use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct Review {
    pub review_id: i32,
    pub book_id: String,
    pub user_id: Uuid,
    pub user_fullname: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: String,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i64,
}

pub fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::invalid("rating must be between 1 and 5"));
    }
    Ok(())
}

/// Rounds an average rating to one decimal place.
pub fn round_rating(avg: f64) -> f64 {
    (avg * 10.0).round() / 10.0
}
