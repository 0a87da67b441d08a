use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::Utc;
use diesel::dsl::{avg, count_star, exists};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::ReviewRepository;
use crate::domain::review::{round_rating, NewReview, RatingSummary, Review, ReviewChanges};
use crate::schema::{books, order_details, orders, reviews, users};

use super::models::{NewReviewRow, ReviewChangeset, ReviewRow};

fn to_review(row: ReviewRow, user_fullname: Option<String>) -> Review {
    Review {
        review_id: row.review_id,
        book_id: row.book_id,
        user_id: row.user_id,
        user_fullname,
        rating: row.rating,
        comment: row.comment,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn with_author(conn: &mut PgConnection, row: ReviewRow) -> Result<Review, DomainError> {
    let name = users::table
        .find(row.user_id)
        .select(users::full_name)
        .first::<String>(conn)
        .optional()?;
    Ok(to_review(row, name))
}

pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ReviewRepository for DieselReviewRepository {
    fn list_for_book(&self, book_id: &str) -> Result<Vec<Review>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = reviews::table
            .inner_join(users::table)
            .filter(reviews::book_id.eq(book_id))
            .order((reviews::created_at.desc(), reviews::review_id.desc()))
            .select((ReviewRow::as_select(), users::full_name))
            .load::<(ReviewRow, String)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(row, name)| to_review(row, Some(name)))
            .collect())
    }

    fn summary(&self, book_id: &str) -> Result<RatingSummary, DomainError> {
        let mut conn = self.pool.get()?;
        let (average, total) = reviews::table
            .filter(reviews::book_id.eq(book_id))
            .select((avg(reviews::rating), count_star()))
            .first::<(Option<BigDecimal>, i64)>(&mut conn)?;
        let average_rating = average
            .and_then(|a| a.to_f64())
            .map(round_rating)
            .unwrap_or(0.0);
        Ok(RatingSummary {
            average_rating,
            total_reviews: total,
        })
    }

    fn book_exists(&self, book_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let found = diesel::select(exists(books::table.find(book_id))).get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn has_purchased(&self, user_id: Uuid, book_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let found = diesel::select(exists(
            order_details::table
                .inner_join(orders::table)
                .filter(orders::user_id.eq(user_id))
                .filter(order_details::book_id.eq(book_id))
                .filter(orders::status_id.ne(OrderStatus::Cancelled.code())),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn find(&self, review_id: i32) -> Result<Option<Review>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = reviews::table
            .find(review_id)
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|r| with_author(&mut conn, r)).transpose()
    }

    fn find_by_author(&self, user_id: Uuid, book_id: &str) -> Result<Option<Review>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = reviews::table
            .filter(reviews::user_id.eq(user_id))
            .filter(reviews::book_id.eq(book_id))
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|r| with_author(&mut conn, r)).transpose()
    }

    fn insert(&self, review: NewReview) -> Result<Review, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(reviews::table)
            .values(&NewReviewRow {
                book_id: &review.book_id,
                user_id: review.user_id,
                rating: review.rating,
                comment: review.comment.as_deref(),
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut conn)?;
        with_author(&mut conn, row)
    }

    fn update(&self, review_id: i32, changes: ReviewChanges) -> Result<Review, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(reviews::table.find(review_id))
            .set(&ReviewChangeset {
                rating: changes.rating,
                comment: changes.comment.as_deref(),
                updated_at: Utc::now(),
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found(format!("Review {review_id}")))?;
        with_author(&mut conn, row)
    }

    fn delete(&self, review_id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(reviews::table.find(review_id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
