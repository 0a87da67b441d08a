pub mod admin_users;
pub mod auth;
pub mod books;
pub mod categories;
pub mod contacts;
pub mod dashboard;
pub mod orders;
pub mod reviews;
pub mod users;

use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

pub(crate) fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamps query paging to `skip >= 0` and `1 <= limit <= 100`.
pub(crate) fn page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, MAX_LIMIT))
}

/// Money crosses the API as a decimal string, e.g. `"85000.00"`.
pub(crate) fn money(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}

pub(crate) fn parse_money(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("{field} must be a decimal number, got '{raw}'")))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn message(text: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: text.into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Registers every route. Literal segments come before `{id}` captures.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api")
            .service(
                web::scope("/users")
                    .route("/register", web::post().to(users::register))
                    .route("/login", web::post().to(users::login))
                    .route("/me", web::get().to(users::me))
                    .route("/me", web::put().to(users::update_me)),
            )
            .service(
                web::scope("/admin/users")
                    .route("", web::get().to(admin_users::list_users))
                    .route("", web::post().to(admin_users::create_user))
                    .route("/{id}", web::get().to(admin_users::get_user))
                    .route("/{id}", web::put().to(admin_users::update_user))
                    .route("/{id}", web::delete().to(admin_users::delete_user)),
            )
            .service(
                web::scope("/books")
                    .route("", web::get().to(books::list_books))
                    .route("", web::post().to(books::create_book))
                    .route("/{id}", web::get().to(books::get_book))
                    .route("/{id}", web::put().to(books::update_book))
                    .route("/{id}", web::delete().to(books::delete_book)),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::list_categories))
                    .route("", web::post().to(categories::create_category))
                    .route("/{id}", web::get().to(categories::get_category))
                    .route("/{id}", web::put().to(categories::rename_category))
                    .route("/{id}", web::delete().to(categories::delete_category)),
            )
            .route("/payment-methods", web::get().to(categories::list_payment_methods))
            .service(
                web::scope("/discounts")
                    .route("", web::get().to(categories::list_discounts))
                    .route("", web::post().to(categories::create_discount)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::create_order))
                    .route("/my-orders", web::get().to(orders::my_orders))
                    .route("/admin/all", web::get().to(orders::all_orders))
                    .route("/admin/{id}/status", web::put().to(orders::update_status))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/cancel", web::put().to(orders::cancel_order))
                    .route("/{id}/confirm-delivery", web::put().to(orders::confirm_delivery)),
            )
            .service(
                web::scope("/reviews")
                    .route("", web::post().to(reviews::create_review))
                    .route("/book/{book_id}", web::get().to(reviews::list_reviews))
                    .route("/book/{book_id}/summary", web::get().to(reviews::review_summary))
                    .route("/{id}", web::put().to(reviews::update_review))
                    .route("/{id}", web::delete().to(reviews::delete_review)),
            )
            .service(
                web::scope("/contacts")
                    .route("", web::post().to(contacts::create_contact))
                    .route("", web::get().to(contacts::list_contacts))
                    .route("/{id}", web::get().to(contacts::get_contact))
                    .route("/{id}", web::delete().to(contacts::delete_contact))
                    .route("/{id}/reply", web::put().to(contacts::reply_contact)),
            )
            .service(
                web::scope("/dashboard")
                    .route("/stats", web::get().to(dashboard::stats))
                    .route("/order-status", web::get().to(dashboard::order_status))
                    .route("/monthly-trends", web::get().to(dashboard::monthly_trends)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        assert_eq!(page(-5, 0), (0, 1));
        assert_eq!(page(10, 500), (10, MAX_LIMIT));
        assert_eq!(page(0, DEFAULT_LIMIT), (0, 20));
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(&BigDecimal::from(230_000)), "230000.00");
        assert!(parse_money("price", "85000.5").is_ok());
        assert!(parse_money("price", "eighty").is_err());
    }
}
