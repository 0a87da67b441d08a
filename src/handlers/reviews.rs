use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::review::{RatingSummary, Review, ReviewChanges};
use crate::domain::user::Identity;
use crate::errors::AppError;
use crate::Reviews;

use super::message;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub book_id: String,
    /// 1 to 5.
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub review_id: i32,
    pub book_id: String,
    pub user_id: Uuid,
    pub user_fullname: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        ReviewResponse {
            review_id: r.review_id,
            book_id: r.book_id,
            user_id: r.user_id,
            user_fullname: r.user_fullname,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub book_id: String,
    /// Rounded to one decimal; 0 when there are no reviews.
    pub average_rating: f64,
    pub total_reviews: i64,
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Book not purchased"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already reviewed"),
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn create_review(
    svc: web::Data<Reviews>,
    caller: Identity,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let CreateReviewRequest {
        book_id,
        rating,
        comment,
    } = body.into_inner();
    let review = web::block(move || svc.create(caller, &book_id, rating, comment)).await??;
    Ok(HttpResponse::Created().json(ReviewResponse::from(review)))
}

#[utoipa::path(
    get,
    path = "/api/reviews/book/{book_id}",
    params(("book_id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Reviews, newest first", body = [ReviewResponse]),
        (status = 404, description = "Book not found"),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    svc: web::Data<Reviews>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    let reviews = web::block(move || svc.list_for_book(&book_id)).await??;
    Ok(HttpResponse::Ok().json(
        reviews
            .into_iter()
            .map(ReviewResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reviews/book/{book_id}/summary",
    params(("book_id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Rating summary", body = SummaryResponse),
        (status = 404, description = "Book not found"),
    ),
    tag = "reviews"
)]
pub async fn review_summary(
    svc: web::Data<Reviews>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();
    let lookup = book_id.clone();
    let RatingSummary {
        average_rating,
        total_reviews,
    } = web::block(move || svc.summary(&lookup)).await??;
    Ok(HttpResponse::Ok().json(SummaryResponse {
        book_id,
        average_rating,
        total_reviews,
    }))
}

#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = ReviewResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn update_review(
    svc: web::Data<Reviews>,
    caller: Identity,
    path: web::Path<i32>,
    body: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let changes = ReviewChanges {
        rating: body.rating,
        comment: body.comment,
    };
    let review = web::block(move || svc.update(caller, id, changes)).await??;
    Ok(HttpResponse::Ok().json(ReviewResponse::from(review)))
}

/// DELETE /api/reviews/{id}
///
/// Admins may delete any review.
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
pub async fn delete_review(
    svc: web::Data<Reviews>,
    caller: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || svc.delete(caller, id)).await??;
    Ok(message("Review deleted"))
}
