use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{
    books, categories, contacts, discount_applications, discounts, order_details, orders,
    payment_methods, reviews, users,
};

// ── Identity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub id: Uuid,
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub role: &'a str,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset<'a> {
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub role: Option<&'a str>,
}

impl UserChangeset<'_> {
    /// Diesel rejects an `UPDATE` with an empty `SET` list.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.role.is_none()
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = categories)]
#[diesel(primary_key(category_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = books)]
#[diesel(primary_key(book_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookRow {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category_id: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub sold_quantity: i32,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = books)]
pub struct NewBookRow<'a> {
    pub book_id: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub publisher: Option<&'a str>,
    pub publication_year: Option<i32>,
    pub category_id: Option<&'a str>,
    pub price: &'a BigDecimal,
    pub stock_quantity: i32,
    pub description: Option<&'a str>,
    pub cover_image_url: Option<&'a str>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = books)]
pub struct BookChangeset<'a> {
    pub title: Option<&'a str>,
    pub author: Option<&'a str>,
    pub publisher: Option<&'a str>,
    pub publication_year: Option<i32>,
    pub category_id: Option<&'a str>,
    pub price: Option<&'a BigDecimal>,
    pub stock_quantity: Option<i32>,
    pub description: Option<&'a str>,
    pub cover_image_url: Option<&'a str>,
}

impl BookChangeset<'_> {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.publication_year.is_none()
            && self.category_id.is_none()
            && self.price.is_none()
            && self.stock_quantity.is_none()
            && self.description.is_none()
            && self.cover_image_url.is_none()
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payment_methods)]
#[diesel(primary_key(payment_method_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentMethodRow {
    pub payment_method_id: String,
    pub method_name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = discounts)]
#[diesel(primary_key(discount_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DiscountRow {
    pub discount_id: String,
    pub voucher_code: String,
    pub discount_percentage: BigDecimal,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discounts)]
pub struct NewDiscountRow<'a> {
    pub discount_id: &'a str,
    pub voucher_code: &'a str,
    pub discount_percentage: &'a BigDecimal,
    pub expiry_date: DateTime<Utc>,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(primary_key(order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub order_id: String,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub status_id: String,
    pub shipping_address: String,
    pub payment_method_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub order_id: &'a str,
    pub user_id: Uuid,
    pub total_amount: &'a BigDecimal,
    pub status_id: &'a str,
    pub shipping_address: &'a str,
    pub payment_method_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_details)]
#[diesel(primary_key(detail_id))]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderDetailRow {
    pub detail_id: i32,
    pub order_id: String,
    pub book_id: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_details)]
pub struct NewOrderDetailRow<'a> {
    pub order_id: &'a str,
    pub book_id: &'a str,
    pub quantity: i32,
    pub unit_price: &'a BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discount_applications)]
pub struct NewDiscountApplicationRow<'a> {
    pub order_id: &'a str,
    pub discount_id: &'a str,
}

// ── Reviews & contacts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = reviews)]
#[diesel(primary_key(review_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewRow {
    pub review_id: i32,
    pub book_id: String,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewRow<'a> {
    pub book_id: &'a str,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<&'a str>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = reviews)]
pub struct ReviewChangeset<'a> {
    pub rating: Option<i32>,
    pub comment: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = contacts)]
#[diesel(primary_key(contact_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContactRow {
    pub contact_id: i32,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub admin_response: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContactRow<'a> {
    pub user_id: Option<Uuid>,
    pub full_name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
    pub status: &'a str,
    pub sent_at: DateTime<Utc>,
}
